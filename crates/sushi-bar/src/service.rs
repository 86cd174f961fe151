use std::{future::Future, sync::Arc, time::Duration};

use shared::{
    EnterReply, EnterRequest, LeaveReply, LeaveRequest, StatusReply, StatusRequest, SushiBar,
    SushiBarServer, sushi_bar::Occupant as OccupantReply,
};
use tokio::net::TcpListener;
use tokio_stream::wrappers::TcpListenerStream;
use tonic::{Request, Response, Status, transport::Server};
use tracing::info;

use crate::admission::{AdmissionController, Ticket};

/// gRPC front of the [`AdmissionController`].
#[derive(Clone, Debug)]
pub struct SushiBarService {
    controller: Arc<AdmissionController>,
    enter_timeout: Option<Duration>,
}

impl SushiBarService {
    pub fn new(controller: Arc<AdmissionController>) -> Self {
        Self {
            controller,
            enter_timeout: None,
        }
    }

    /// Give up on queued `Enter` calls after `timeout` instead of waiting forever.
    pub fn with_enter_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.enter_timeout = timeout;
        self
    }

    pub fn controller(&self) -> &Arc<AdmissionController> {
        &self.controller
    }
}

#[tonic::async_trait]
impl SushiBar for SushiBarService {
    async fn enter(&self, request: Request<EnterRequest>) -> Result<Response<EnterReply>, Status> {
        let EnterRequest { client_name } = request.into_inner();
        info!("enter requested by {}", client_name);

        let admission = match self.enter_timeout {
            Some(timeout) => self.controller.enter_within(client_name, timeout).await?,
            None => self.controller.enter(client_name).await,
        };

        Ok(Response::new(EnterReply {
            ticket: admission.ticket.get(),
            waited_ms: u64::try_from(admission.waited.as_millis()).unwrap_or(u64::MAX),
        }))
    }

    async fn leave(&self, request: Request<LeaveRequest>) -> Result<Response<LeaveReply>, Status> {
        let ticket = Ticket::new(request.into_inner().ticket);
        let departure = self.controller.leave(ticket)?;

        Ok(Response::new(LeaveReply {
            farewell: departure.occupant.farewell(),
        }))
    }

    async fn status(
        &self,
        _request: Request<StatusRequest>,
    ) -> Result<Response<StatusReply>, Status> {
        let snapshot = self.controller.snapshot();

        Ok(Response::new(StatusReply {
            capacity: saturating_u32(snapshot.capacity),
            occupants: snapshot
                .occupants
                .into_iter()
                .map(|o| OccupantReply {
                    ticket: o.ticket.get(),
                    name: o.name,
                })
                .collect(),
            waiting: saturating_u32(snapshot.waiting),
            last_ticket: snapshot.last_ticket.map_or(0, Ticket::get),
        }))
    }
}

fn saturating_u32(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

/// Serve the sushi bar on an already-bound listener until `shutdown` resolves.
pub async fn serve<F>(
    listener: TcpListener,
    service: SushiBarService,
    shutdown: F,
) -> Result<(), tonic::transport::Error>
where
    F: Future<Output = ()> + Send,
{
    Server::builder()
        .add_service(SushiBarServer::new(service))
        .serve_with_incoming_shutdown(TcpListenerStream::new(listener), shutdown)
        .await
}
