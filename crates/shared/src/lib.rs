//! Wire contract shared by the sushi bar server and its clients.

/// Generated protobuf messages plus the tonic client and server for `sushibar.SushiBar`.
pub mod sushi_bar {
    tonic::include_proto!("sushibar");
}

pub use sushi_bar::sushi_bar_client::SushiBarClient;
pub use sushi_bar::sushi_bar_server::{SushiBar, SushiBarServer};
pub use sushi_bar::{
    EnterReply, EnterRequest, LeaveReply, LeaveRequest, Occupant, StatusReply, StatusRequest,
};

/// Port the client dials when none is given. The server has no default; it insists on `PORT`.
pub const DEFAULT_PORT: u16 = 50051;
