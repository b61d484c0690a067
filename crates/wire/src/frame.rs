// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Domain-facing framing for the Backend `AgentStream` (§4.3). Keeping these
//! types distinct from the generated `proto` types means a change to the
//! `.proto` file surfaces as a conversion-site compile error instead of
//! spreading prost-specific shapes (oneof submodules, `i64`-everywhere) into
//! the rest of the crate graph.

use crate::proto;
use dispatchd_core::{AgentId, JobId, QueueType};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FrameError {
    #[error("agent stream frame is missing its oneof payload")]
    MissingFrame,
}

/// Inbound frames the backend receives on `AgentStream` (§4.3: INIT, HEARTBEAT, LOG_MESSAGE).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Init { agent_id: AgentId },
    Heartbeat,
    LogMessage { job_id: JobId, level: String, timestamp_ms: i64, message: String, stage: Option<String> },
}

/// Outbound frames the backend sends on `AgentStream` (§4.3: HEALTH_CHECK_PING, TASK_ASSIGNMENT).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundFrame {
    HealthCheckPing,
    TaskAssignment { job_id: JobId, queue_type: QueueType },
}

impl TryFrom<proto::AgentStreamRequest> for Frame {
    type Error = FrameError;

    fn try_from(value: proto::AgentStreamRequest) -> Result<Self, Self::Error> {
        use proto::agent_stream_request::Frame as WireFrame;

        match value.frame.ok_or(FrameError::MissingFrame)? {
            WireFrame::Init(init) => Ok(Frame::Init { agent_id: AgentId::from(init.agent_id.as_str()) }),
            WireFrame::Heartbeat(_) => Ok(Frame::Heartbeat),
            WireFrame::LogMessage(log) => Ok(Frame::LogMessage {
                job_id: JobId::from(log.job_id.as_str()),
                level: log.level,
                timestamp_ms: log.timestamp_ms,
                message: log.message,
                stage: log.stage,
            }),
        }
    }
}

impl From<OutboundFrame> for proto::AgentStreamMessage {
    fn from(value: OutboundFrame) -> Self {
        use proto::agent_stream_message::Frame as WireFrame;

        let frame = match value {
            OutboundFrame::HealthCheckPing => WireFrame::HealthCheckPing(proto::HealthCheckPingFrame {}),
            OutboundFrame::TaskAssignment { job_id, queue_type } => {
                WireFrame::TaskAssignment(proto::TaskAssignmentFrame { job_id: job_id.to_string(), queue_type: queue_type.to_string() })
            }
        };
        proto::AgentStreamMessage { frame: Some(frame) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_frame_round_trips_through_the_wire_oneof() {
        let agent_id = AgentId::new();
        let wire = proto::AgentStreamRequest {
            frame: Some(proto::agent_stream_request::Frame::Init(proto::InitFrame { agent_id: agent_id.to_string() })),
        };
        let frame = Frame::try_from(wire).unwrap();
        assert_eq!(frame, Frame::Init { agent_id });
    }

    #[test]
    fn heartbeat_frame_round_trips() {
        let wire = proto::AgentStreamRequest { frame: Some(proto::agent_stream_request::Frame::Heartbeat(proto::HeartbeatFrame {})) };
        assert_eq!(Frame::try_from(wire).unwrap(), Frame::Heartbeat);
    }

    #[test]
    fn missing_oneof_is_an_error() {
        let wire = proto::AgentStreamRequest { frame: None };
        assert!(matches!(Frame::try_from(wire), Err(FrameError::MissingFrame)));
    }

    #[test]
    fn task_assignment_encodes_queue_type_as_its_display_string() {
        let job_id = JobId::new();
        let msg = proto::AgentStreamMessage::from(OutboundFrame::TaskAssignment { job_id, queue_type: QueueType::Rework });
        match msg.frame {
            Some(proto::agent_stream_message::Frame::TaskAssignment(t)) => {
                assert_eq!(t.job_id, job_id.to_string());
                assert_eq!(t.queue_type, "rework");
            }
            _ => panic!("expected task assignment frame"),
        }
    }

    #[test]
    fn health_check_ping_round_trips() {
        let msg = proto::AgentStreamMessage::from(OutboundFrame::HealthCheckPing);
        assert!(matches!(msg.frame, Some(proto::agent_stream_message::Frame::HealthCheckPing(_))));
    }
}
