pub mod base_change;
pub mod fill;
pub mod inspect;
pub mod transitions;
