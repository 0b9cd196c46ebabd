#![warn(clippy::cloned_instead_of_copied)]
#![warn(clippy::equatable_if_let)]
#![warn(clippy::explicit_iter_loop)]
#![warn(clippy::expect_used)]
#![warn(clippy::inefficient_to_string)]
#![warn(clippy::manual_let_else)]
#![warn(clippy::manual_string_new)]
#![warn(clippy::match_same_arms)]
#![warn(clippy::missing_errors_doc)]
#![warn(clippy::needless_pass_by_value)]
#![warn(clippy::panic)]
#![warn(clippy::print_stdout)]
#![warn(clippy::str_to_string)]
#![warn(clippy::uninlined_format_args)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::use_self)]

//! Client of the Hojas de Servicio backend: session handling, guarded routing and the data
//! stores the views read from.

pub mod app;
pub mod config;
pub mod guard;
pub mod http;
pub mod router;
pub mod routes;
pub mod stores;
pub mod viewer;
