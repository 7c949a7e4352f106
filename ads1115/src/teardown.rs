use log::{debug, warn};

use crate::Error;

type ReleaseStep<'a> = Box<dyn FnOnce() -> Result<(), Error> + 'a>;

/// Release steps recorded in acquisition order and run in reverse.
///
/// A failing step does not stop the ones after it. The first failure is
/// returned once every step has run.
pub(crate) struct Teardown<'a> {
    steps: Vec<(&'static str, ReleaseStep<'a>)>,
}

impl<'a> Teardown<'a> {
    pub fn new() -> Teardown<'a> {
        Teardown { steps: Vec::new() }
    }

    pub fn push(&mut self, name: &'static str, step: impl FnOnce() -> Result<(), Error> + 'a) {
        self.steps.push((name, Box::new(step)));
    }

    pub fn run(self) -> Result<(), Error> {
        let mut first_error = None;

        for (name, step) in self.steps.into_iter().rev() {
            match step() {
                Ok(()) => debug!("released {}", name),
                Err(e) => {
                    warn!("could not release {}: {}", name, e);
                    first_error.get_or_insert(e);
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod test {
    use std::cell::RefCell;

    use super::*;
    use crate::BusError;

    #[test]
    fn runs_in_reverse_order() {
        let order = RefCell::new(Vec::new());

        let mut teardown = Teardown::new();
        teardown.push("first", || {
            order.borrow_mut().push("first");
            Ok(())
        });
        teardown.push("second", || {
            order.borrow_mut().push("second");
            Ok(())
        });

        assert_eq!(teardown.run(), Ok(()));
        assert_eq!(*order.borrow(), vec!["second", "first"]);
    }

    #[test]
    fn failure_does_not_skip_remaining_steps() {
        let order = RefCell::new(Vec::new());

        let mut teardown = Teardown::new();
        teardown.push("bus", || {
            order.borrow_mut().push("bus");
            Err(Error::Release(BusError::Timeout))
        });
        teardown.push("access point", || {
            order.borrow_mut().push("access point");
            Err(Error::Release(BusError::Nack))
        });

        assert_eq!(teardown.run(), Err(Error::Release(BusError::Nack)));
        assert_eq!(*order.borrow(), vec!["access point", "bus"]);
    }
}
