//! Status enums that only move along a fixed set of edges.

use super::ValidationError;

pub trait StateMachine: Sized + Copy + PartialEq + std::fmt::Debug {
    /// Edge check. A self-loop counts only if the implementor allows it.
    fn can_transition_to(&self, target: &Self) -> bool;

    /// Every state reachable in one step.
    fn valid_transitions(&self) -> Vec<Self>;

    /// # Errors
    ///
    /// `InvalidFormat` on the `state_transition` field when the edge is not allowed.
    fn transition_to(&self, target: Self) -> Result<Self, ValidationError> {
        if !self.can_transition_to(&target) {
            return Err(ValidationError::invalid_format(
                "state_transition",
                format!("{:?} cannot move to {:?}", self, target),
            ));
        }
        Ok(target)
    }

    fn is_terminal(&self) -> bool {
        self.valid_transitions().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Booking {
        Requested,
        Scheduled,
        Done,
    }

    impl StateMachine for Booking {
        fn can_transition_to(&self, target: &Self) -> bool {
            self.valid_transitions().contains(target)
        }

        fn valid_transitions(&self) -> Vec<Self> {
            match self {
                Booking::Requested => vec![Booking::Scheduled, Booking::Done],
                Booking::Scheduled => vec![Booking::Done],
                Booking::Done => Vec::new(),
            }
        }
    }

    #[test]
    fn allowed_edge_yields_target() {
        assert_eq!(Booking::Requested.transition_to(Booking::Scheduled), Ok(Booking::Scheduled));
    }

    #[test]
    fn backwards_edge_is_rejected_with_both_states_named() {
        let err = Booking::Scheduled.transition_to(Booking::Requested).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("Scheduled"), "{}", message);
        assert!(message.contains("Requested"), "{}", message);
    }

    #[test]
    fn terminal_state_has_no_edges() {
        assert!(Booking::Done.is_terminal());
        assert!(!Booking::Requested.is_terminal());
    }
}
