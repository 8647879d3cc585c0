//! Position-based Fibonacci numbers for the `fibo` command.
//!
//! Positions start at 1 with the value 0, so the sequence reads
//! 0, 1, 1, 2, 3, 5, ... and `nth(10)` is 34.

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FibonacciError {
    #[error("Invalid number please enter positive int number")]
    Negative(i64),

    #[error("The {0}'th number of the fibonacci sequence does not fit in 128 bits")]
    Overflow(i64),
}

/// The `n`th number of the sequence. Position 0 is treated as 0.
pub fn nth(n: i64) -> Result<u128, FibonacciError> {
    if n < 0 {
        return Err(FibonacciError::Negative(n));
    }
    if n <= 1 {
        return Ok(0);
    }

    let (mut prev, mut current): (u128, u128) = (0, 1);
    for _ in 2..n {
        let next = prev
            .checked_add(current)
            .ok_or(FibonacciError::Overflow(n))?;
        prev = current;
        current = next;
    }
    Ok(current)
}
