use std::sync::Arc;

use loanboard_core::application::LoanboardService;

use crate::args::Args;

#[derive(Clone)]
pub struct AppState {
    pub args: Arc<Args>,
    pub service: LoanboardService,
}

impl AppState {
    pub fn new(args: Arc<Args>, service: LoanboardService) -> Self {
        Self { args, service }
    }
}
