pub mod state_machine;

pub use state_machine::{
    step, AlertEvent, AlertKind, AlertPhase, DrowsinessState, DrowsinessStateMachine,
};
