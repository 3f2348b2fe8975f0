pub mod router;

pub use router::{
    FetchFailure, RoutingError, Selection, TaskApply, TaskFetchTicket, TaskListState, ToolRouter,
};
