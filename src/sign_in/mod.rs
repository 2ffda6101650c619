pub mod flow;
pub mod form;

pub use flow::{SignInError, SignInFlow, SignInState, SignedIn};
pub use form::{Credentials, Field, FieldError, LoginMode, SignInForm};
