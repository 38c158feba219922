//! Recording session state machine
//!
//! All transitions go through [`reduce`], which returns the next state and
//! the effects the capture owner must run, in order. The reducer never
//! touches the device itself.

use std::time::{Duration, Instant};
use uuid::Uuid;

use crate::audio::{CaptureConstraints, QualityPreset};
use crate::error::{AudioError, Result};

pub type SessionId = Uuid;

#[derive(Debug, Clone, Default)]
pub enum SessionState {
    #[default]
    Idle,
    Recording {
        session_id: SessionId,
        preset: QualityPreset,
        started_at: Instant,
    },
    Stopped {
        session_id: SessionId,
        preset: QualityPreset,
        elapsed: Duration,
    },
}

impl SessionState {
    pub fn is_recording(&self) -> bool {
        matches!(self, SessionState::Recording { .. })
    }

    pub fn session_id(&self) -> Option<SessionId> {
        match self {
            SessionState::Idle => None,
            SessionState::Recording { session_id, .. } | SessionState::Stopped { session_id, .. } => {
                Some(*session_id)
            }
        }
    }

    pub fn preset(&self) -> Option<QualityPreset> {
        match self {
            SessionState::Idle => None,
            SessionState::Recording { preset, .. } | SessionState::Stopped { preset, .. } => {
                Some(*preset)
            }
        }
    }

    /// Time spent recording: live while recording, frozen once stopped.
    pub fn elapsed(&self) -> Duration {
        match self {
            SessionState::Idle => Duration::ZERO,
            SessionState::Recording { started_at, .. } => started_at.elapsed(),
            SessionState::Stopped { elapsed, .. } => *elapsed,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SessionState::Idle => "idle",
            SessionState::Recording { .. } => "recording",
            SessionState::Stopped { .. } => "stopped",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub enum SessionEvent {
    Start { preset: QualityPreset },
    Stop,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionEffect {
    AcquireDevice {
        id: SessionId,
        constraints: CaptureConstraints,
    },
    /// Begin publishing levels from analysis frames.
    StartMeter { id: SessionId },
    /// Cease publishing levels; runs before the device is released.
    StopMeter { id: SessionId },
    ReleaseDevice { id: SessionId },
    /// Hand the accumulated chunks over as one buffer.
    FlushChunks { id: SessionId },
}

/// Reducer function: (state, event) -> (next_state, effects)
///
/// `Stopped` is not terminal: starting again opens a fresh session with a
/// new id.
pub fn reduce(
    state: &SessionState,
    event: SessionEvent,
) -> Result<(SessionState, Vec<SessionEffect>)> {
    use SessionEffect::*;
    use SessionEvent::*;
    use SessionState::*;

    match (state, event) {
        (Idle | Stopped { .. }, Start { preset }) => {
            let id = Uuid::new_v4();
            Ok((
                Recording {
                    session_id: id,
                    preset,
                    started_at: Instant::now(),
                },
                vec![
                    AcquireDevice {
                        id,
                        constraints: preset.constraints(),
                    },
                    StartMeter { id },
                ],
            ))
        }
        (Recording { .. }, Start { .. }) => Err(AudioError::AlreadyRecording),

        (
            Recording {
                session_id,
                preset,
                started_at,
            },
            Stop,
        ) => {
            let id = *session_id;
            Ok((
                Stopped {
                    session_id: id,
                    preset: *preset,
                    elapsed: started_at.elapsed(),
                },
                vec![StopMeter { id }, ReleaseDevice { id }, FlushChunks { id }],
            ))
        }
        (Idle | Stopped { .. }, Stop) => Err(AudioError::NotRecording),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn start(state: &SessionState) -> (SessionState, Vec<SessionEffect>) {
        reduce(
            state,
            SessionEvent::Start {
                preset: QualityPreset::High,
            },
        )
        .unwrap()
    }

    #[test]
    fn idle_start_transitions_to_recording() {
        let (next, effects) = start(&SessionState::Idle);
        assert!(next.is_recording());
        assert_eq!(next.preset(), Some(QualityPreset::High));
        assert!(matches!(
            effects.as_slice(),
            [SessionEffect::AcquireDevice { constraints, .. }, SessionEffect::StartMeter { .. }]
                if constraints.sample_rate_hz == 44_100
        ));
    }

    #[test]
    fn start_while_recording_fails() {
        let (recording, _) = start(&SessionState::Idle);
        let err = reduce(
            &recording,
            SessionEvent::Start {
                preset: QualityPreset::Low,
            },
        )
        .unwrap_err();
        assert!(matches!(err, AudioError::AlreadyRecording));
    }

    #[test]
    fn stop_cancels_meter_before_releasing_device() {
        let (recording, _) = start(&SessionState::Idle);
        let id = recording.session_id().unwrap();
        let (stopped, effects) = reduce(&recording, SessionEvent::Stop).unwrap();
        assert!(matches!(stopped, SessionState::Stopped { session_id, .. } if session_id == id));
        assert_eq!(
            effects,
            vec![
                SessionEffect::StopMeter { id },
                SessionEffect::ReleaseDevice { id },
                SessionEffect::FlushChunks { id },
            ]
        );
    }

    #[test]
    fn stop_when_not_recording_fails() {
        assert!(matches!(
            reduce(&SessionState::Idle, SessionEvent::Stop),
            Err(AudioError::NotRecording)
        ));
        let (recording, _) = start(&SessionState::Idle);
        let (stopped, _) = reduce(&recording, SessionEvent::Stop).unwrap();
        assert!(matches!(
            reduce(&stopped, SessionEvent::Stop),
            Err(AudioError::NotRecording)
        ));
    }

    #[test]
    fn stopped_can_start_a_new_session() {
        let (first, _) = start(&SessionState::Idle);
        let (stopped, _) = reduce(&first, SessionEvent::Stop).unwrap();
        let (second, _) = start(&stopped);
        assert!(second.is_recording());
        assert_ne!(first.session_id(), second.session_id());
    }

    #[test]
    fn elapsed_is_frozen_after_stop() {
        let (recording, _) = start(&SessionState::Idle);
        let (stopped, _) = reduce(&recording, SessionEvent::Stop).unwrap();
        let frozen = stopped.elapsed();
        std::thread::sleep(Duration::from_millis(5));
        assert_eq!(stopped.elapsed(), frozen);
        assert_eq!(SessionState::Idle.elapsed(), Duration::ZERO);
    }
}
