use std::time::{Duration, Instant};

use anyhow::{Context, anyhow};
use clap::{Parser, Subcommand};
use shared::{DEFAULT_PORT, EnterRequest, LeaveRequest, StatusRequest, SushiBarClient};
use tonic::{Code, transport::Channel};

#[derive(Parser, Debug)]
/// Command-line client for the sushi bar server.
struct Opts {
    /// Sushi bar server URL
    #[arg(long, env = "SUSHI_BAR_SERVER", default_value_t = format!("http://127.0.0.1:{DEFAULT_PORT}"))]
    server: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
enum Command {
    /// Wait for a seat and print the ticket
    Enter {
        #[arg(value_name = "NAME")]
        name: String,
    },

    /// Give up the seat held by a ticket
    Leave {
        #[arg(value_name = "TICKET")]
        ticket: u64,
    },

    /// Show who is seated and how many are waiting
    Status,

    /// Enter, stay for a while, then leave
    Visit {
        #[arg(value_name = "NAME")]
        name: String,

        /// How long to stay seated
        #[arg(long, default_value_t = 1000)]
        stay_ms: u64,
    },
}

async fn enter(client: &mut SushiBarClient<Channel>, name: &str) -> anyhow::Result<u64> {
    let reply = client
        .enter(EnterRequest {
            client_name: name.to_string(),
        })
        .await
        .context("enter failed")?
        .into_inner();

    println!(
        "{} got ticket {} after waiting {}ms",
        name, reply.ticket, reply.waited_ms
    );
    Ok(reply.ticket)
}

async fn leave(client: &mut SushiBarClient<Channel>, ticket: u64) -> anyhow::Result<()> {
    match client.leave(LeaveRequest { ticket }).await {
        Ok(reply) => {
            println!("{}", reply.into_inner().farewell);
            Ok(())
        }
        Err(status) if status.code() == Code::NotFound => {
            Err(anyhow!("leave rejected: {}", status.message()))
        }
        Err(status) => Err(status).context("leave failed"),
    }
}

async fn status(client: &mut SushiBarClient<Channel>) -> anyhow::Result<()> {
    let status = client
        .status(StatusRequest {})
        .await
        .context("status failed")?
        .into_inner();

    println!(
        "{}/{} seats taken, {} waiting",
        status.occupants.len(),
        status.capacity,
        status.waiting
    );
    for occupant in status.occupants {
        println!("  ticket {:>4}  {}", occupant.ticket, occupant.name);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let start = Instant::now();
    let opts = Opts::parse();

    let mut client = SushiBarClient::connect(opts.server.clone())
        .await
        .with_context(|| format!("failed to connect to {}", opts.server))?;

    match opts.command {
        Command::Enter { name } => {
            enter(&mut client, &name).await?;
        }
        Command::Leave { ticket } => leave(&mut client, ticket).await?,
        Command::Status => status(&mut client).await?,
        Command::Visit { name, stay_ms } => {
            let ticket = enter(&mut client, &name).await?;
            tokio::time::sleep(Duration::from_millis(stay_ms)).await;
            leave(&mut client, ticket).await?;
        }
    }

    println!("total time: {:.2?}", start.elapsed());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_enter_with_explicit_server() {
        let opts =
            Opts::try_parse_from(["sushi-bar-client", "--server", "http://bar:9000", "enter", "Kai"])
                .unwrap();
        assert_eq!(opts.server, "http://bar:9000");
        assert_eq!(
            opts.command,
            Command::Enter {
                name: "Kai".to_string()
            }
        );
    }

    #[test]
    fn visit_defaults_to_one_second_stay() {
        let opts = Opts::try_parse_from(["sushi-bar-client", "visit", "Mio"]).unwrap();
        assert_eq!(
            opts.command,
            Command::Visit {
                name: "Mio".to_string(),
                stay_ms: 1000
            }
        );
    }

    #[test]
    fn leave_requires_numeric_ticket() {
        assert!(Opts::try_parse_from(["sushi-bar-client", "leave", "abc"]).is_err());
        let opts = Opts::try_parse_from(["sushi-bar-client", "leave", "12"]).unwrap();
        assert_eq!(opts.command, Command::Leave { ticket: 12 });
    }
}
