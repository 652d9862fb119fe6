use dioxus::prelude::*;
use dioxus_router::Routable;

use crate::views::{ExamView, SessionScope};

#[derive(Clone, Routable, PartialEq)]
#[rustfmt::skip]
pub enum Route {
    #[layout(SessionScope)]
        #[route("/", ExamView)] Exam {},
}
