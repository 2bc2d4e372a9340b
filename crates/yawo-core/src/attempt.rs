//! Run several fallible attempts concurrently and keep the first success.

use std::sync::mpsc;
use std::thread;

use crate::error::{Error, Result};

/// Outcome of [`first_success`].
#[derive(Debug)]
pub enum Race<T> {
    /// Value of the first attempt to finish successfully
    Won(T),
    /// Every attempt failed, errors in completion order
    AllFailed(Vec<Error>),
}

impl<T> Race<T> {
    pub fn won(self) -> Option<T> {
        match self {
            Self::Won(value) => Some(value),
            Self::AllFailed(_) => None,
        }
    }

    pub fn into_result(self) -> Result<T> {
        match self {
            Self::Won(value) => Ok(value),
            Self::AllFailed(errors) => Err(Error::AllAttemptsFailed {
                attempts: errors.len(),
            }),
        }
    }
}

/// Start every attempt on its own scoped thread; the first `Ok` wins.
///
/// Losing attempts are not cancelled: they run to completion and their
/// results are dropped. No attempts at all counts as all failed.
pub fn first_success<T, F>(attempts: Vec<F>) -> Race<T>
where
    T: Send,
    F: FnOnce() -> Result<T> + Send,
{
    thread::scope(|scope| {
        let (tx, rx) = mpsc::channel();
        for attempt in attempts {
            let tx = tx.clone();
            scope.spawn(move || {
                // Receiver is gone once a winner was picked
                let _ = tx.send(attempt());
            });
        }
        drop(tx);

        let mut errors = Vec::new();
        for result in rx {
            match result {
                Ok(value) => return Race::Won(value),
                Err(e) => errors.push(e),
            }
        }
        Race::AllFailed(errors)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    type Attempt = Box<dyn FnOnce() -> Result<u32> + Send>;

    fn fail() -> Result<u32> {
        Err(Error::InvalidLocation("nope".to_string()))
    }

    #[test]
    fn test_single_success_wins() {
        let attempts: Vec<Attempt> = vec![Box::new(fail), Box::new(|| Ok(7)), Box::new(fail)];
        assert_eq!(first_success(attempts).won(), Some(7));
    }

    #[test]
    fn test_fastest_success_wins() {
        let attempts: Vec<Attempt> = vec![
            Box::new(|| {
                thread::sleep(Duration::from_millis(200));
                Ok(1)
            }),
            Box::new(|| Ok(2)),
        ];
        assert_eq!(first_success(attempts).won(), Some(2));
    }

    #[test]
    fn test_all_failed_is_distinct() {
        let attempts: Vec<Attempt> = vec![Box::new(fail), Box::new(fail)];
        match first_success(attempts) {
            Race::AllFailed(errors) => assert_eq!(errors.len(), 2),
            Race::Won(_) => panic!("expected all attempts to fail"),
        }
    }

    #[test]
    fn test_no_attempts() {
        let race = first_success(Vec::<Attempt>::new());
        let err = race.into_result().unwrap_err();
        assert!(matches!(err, Error::AllAttemptsFailed { attempts: 0 }));
    }
}
