//! WebSocket handler and event routing
//!
//! Upgrades connections, parses inbound events, and dispatches them
//! against the chat state. Every routing path resolves the sender's role
//! through the connection directory first; events from unrecognized
//! connections and lookups that miss are silent no-ops — the protocol
//! has no error response channel.

use axum::{
    extract::{
        ws::{Message as WsMessage, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures::{stream::StreamExt, SinkExt};
use std::sync::Arc;
use time::OffsetDateTime;
use tokio::sync::mpsc;

use crate::state::AppState;

use super::{
    connection::Connection,
    directory::{AgentIdentity, CustomerIdentity, Role},
    events::{ClientEvent, ServerEvent},
    session::{ChatId, MessageKind},
    state::ChatState,
};

/// WebSocket handler - upgrades the HTTP connection
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Drive one WebSocket connection until it closes
async fn handle_socket(socket: WebSocket, state: AppState) {
    let (mut sender, mut receiver) = socket.split();

    // Channel for pushing events to this connection
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerEvent>();
    let conn = Arc::new(Connection::new(tx));
    let connection_id = conn.connection_id;

    tracing::info!(connection_id = %connection_id, "Connection established");

    // Writer task: serialize outbound events onto the socket
    let send_task = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            match serde_json::to_string(&event) {
                Ok(json) => {
                    if sender.send(WsMessage::Text(json)).await.is_err() {
                        break; // Connection closed
                    }
                }
                Err(e) => {
                    tracing::error!(error = ?e, "Failed to serialize event");
                }
            }
        }
    });

    let chat = state.chat.clone();
    while let Some(msg) = receiver.next().await {
        let Ok(msg) = msg else { break };
        match msg {
            WsMessage::Text(text) => match serde_json::from_str::<ClientEvent>(&text) {
                Ok(event) => handle_client_event(&chat, &conn, event).await,
                Err(e) => {
                    tracing::warn!(
                        error = ?e,
                        message = %text,
                        "Failed to parse client event"
                    );
                }
            },
            WsMessage::Close(_) => {
                tracing::info!(connection_id = %connection_id, "Close frame received");
                break;
            }
            WsMessage::Ping(_) | WsMessage::Pong(_) => {
                // Axum answers pings automatically
            }
            _ => {} // Ignore binary frames
        }
    }

    tracing::info!(connection_id = %connection_id, "Connection closing");
    handle_disconnect(&chat, &conn).await;
    send_task.abort();
}

/// Route one inbound event
pub async fn handle_client_event(chat: &ChatState, conn: &Arc<Connection>, event: ClientEvent) {
    use ClientEvent::*;

    match event {
        JoinAsCustomer { name, username, subject } => {
            let chat_id = ChatId::new();
            let customer = CustomerIdentity {
                connection_id: conn.connection_id,
                name,
                username,
                subject,
                chat_id,
            };
            chat.directory.register_customer(customer.clone()).await;
            let welcome = chat.store.create(customer.clone()).await;
            chat.rooms.join(chat_id, Arc::clone(conn)).await;
            let stats = chat.stats.on_chat_created().await;

            chat.agents
                .broadcast(ServerEvent::NewChat {
                    chat_id,
                    customer,
                    timestamp: OffsetDateTime::now_utc(),
                })
                .await;
            let _ = conn.send(ServerEvent::ChatStarted {
                chat_id,
                message: welcome,
            });
            chat.agents.broadcast(ServerEvent::StatsUpdate { stats }).await;
        }

        JoinAsAgent { name } => {
            let agent = AgentIdentity::new(conn.connection_id, name);
            tracing::info!(
                connection_id = %conn.connection_id,
                agent = %agent.name,
                "Agent joined"
            );
            chat.directory.register_agent(agent).await;
            chat.agents.join(Arc::clone(conn)).await;

            // Snapshot before any subsequent event so the dashboard is
            // consistent from its first frame.
            let chats = chat.store.snapshot_all().await;
            let stats = chat.stats.snapshot().await;
            let _ = conn.send(ServerEvent::InitialData { chats, stats });
        }

        CustomerMessage { message } => {
            let Some(customer) = chat.directory.customer(conn.connection_id).await else {
                return;
            };
            let Some(message) = chat
                .store
                .append_message(customer.chat_id, MessageKind::Customer, message, customer.name)
                .await
            else {
                return;
            };

            chat.agents
                .broadcast(ServerEvent::NewMessage {
                    chat_id: customer.chat_id,
                    message: message.clone(),
                })
                .await;
            let _ = conn.send(ServerEvent::MessageSent { message });
        }

        AgentMessage { chat_id, message } => {
            let Some(agent) = chat.directory.agent(conn.connection_id).await else {
                return;
            };
            let Some(message) = chat
                .store
                .append_message(chat_id, MessageKind::Agent, message, agent.name)
                .await
            else {
                return;
            };

            chat.rooms
                .broadcast(
                    &chat_id,
                    ServerEvent::NewMessage {
                        chat_id,
                        message: message.clone(),
                    },
                )
                .await;
            chat.agents
                .broadcast_except(
                    conn.connection_id,
                    ServerEvent::NewMessage { chat_id, message },
                )
                .await;
        }

        SelectChat { chat_id } => {
            let Some(agent) = chat.directory.agent(conn.connection_id).await else {
                return;
            };

            if chat.store.assign_agent(chat_id, agent).await {
                let stats = chat.stats.on_chat_claimed().await;
                chat.agents.broadcast(ServerEvent::StatsUpdate { stats }).await;
            }

            // The selecting agent always gets the full log, claimed or not
            if let Some((messages, customer)) = chat.store.history(chat_id).await {
                let _ = conn.send(ServerEvent::ChatHistory {
                    chat_id,
                    messages,
                    customer,
                });
            }
        }

        TypingStart { chat_id } => match chat.directory.lookup(conn.connection_id).await {
            Some(Role::Customer(customer)) => {
                chat.agents
                    .broadcast(ServerEvent::UserTyping {
                        chat_id: customer.chat_id,
                        user_name: customer.name,
                    })
                    .await;
            }
            Some(Role::Agent(agent)) => {
                if let Some(chat_id) = chat_id {
                    chat.rooms
                        .broadcast(
                            &chat_id,
                            ServerEvent::AgentTyping {
                                chat_id,
                                agent_name: agent.name,
                            },
                        )
                        .await;
                }
            }
            None => {}
        },

        TypingStop { chat_id } => match chat.directory.lookup(conn.connection_id).await {
            Some(Role::Customer(customer)) => {
                chat.agents
                    .broadcast(ServerEvent::UserTypingStop {
                        chat_id: customer.chat_id,
                    })
                    .await;
            }
            Some(Role::Agent(_)) => {
                if let Some(chat_id) = chat_id {
                    chat.rooms
                        .broadcast(&chat_id, ServerEvent::AgentTypingStop { chat_id })
                        .await;
                }
            }
            None => {}
        },

        TransferChat { chat_id, agent_name } => {
            if chat.directory.lookup(conn.connection_id).await.is_none() {
                return;
            }
            let Some(message) = chat.store.transfer(chat_id, &agent_name).await else {
                return;
            };

            chat.rooms
                .broadcast(
                    &chat_id,
                    ServerEvent::NewMessage {
                        chat_id,
                        message: message.clone(),
                    },
                )
                .await;
            chat.agents
                .broadcast(ServerEvent::ChatTransferred { chat_id, message })
                .await;
        }

        EndChat { chat_id } => {
            if chat.directory.lookup(conn.connection_id).await.is_none() {
                return;
            }
            // end() is idempotent; a repeat end-chat emits nothing
            let Some(message) = chat.store.end(chat_id).await else {
                return;
            };
            let stats = chat.stats.on_chat_ended().await;

            chat.rooms
                .broadcast(
                    &chat_id,
                    ServerEvent::ChatEnded {
                        chat_id,
                        message: Some(message),
                    },
                )
                .await;
            chat.agents.broadcast(ServerEvent::StatsUpdate { stats }).await;
            chat.agents
                .broadcast(ServerEvent::ChatEnded {
                    chat_id,
                    message: None,
                })
                .await;
        }
    }
}

/// Apply disconnect side effects for a departed connection
pub async fn handle_disconnect(chat: &ChatState, conn: &Arc<Connection>) {
    match chat.directory.remove(conn.connection_id).await {
        Some(Role::Customer(customer)) => {
            // The session stays listed until explicitly ended
            if chat.store.mark_customer_disconnected(customer.chat_id).await {
                chat.agents
                    .broadcast(ServerEvent::CustomerDisconnected {
                        chat_id: customer.chat_id,
                    })
                    .await;
            }
            tracing::info!(
                connection_id = %conn.connection_id,
                chat_id = %customer.chat_id,
                "Customer disconnected"
            );
        }
        Some(Role::Agent(agent)) => {
            chat.agents.remove(conn.connection_id).await;
            chat.agents
                .broadcast(ServerEvent::AgentDisconnected {
                    agent_id: agent.connection_id,
                })
                .await;
            tracing::info!(
                connection_id = %conn.connection_id,
                agent = %agent.name,
                "Agent disconnected"
            );
        }
        None => {}
    }

    chat.rooms.remove_connection(conn.connection_id).await;
}
