pub mod callback;
pub mod form;
