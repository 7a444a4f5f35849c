//! 작업 상태 추적.
//!
//! `Pending → Executing → (Succeeded | Failed)`, 재시도 시 `Failed → Pending`.
//! 그 외 전이는 [`ExecError::InvalidTransition`]으로 거부됩니다.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::error::{ExecError, Result};

/// 작업 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationState {
    Pending,
    Executing,
    Succeeded,
    Failed,
}

impl OperationState {
    /// 전이 허용 여부
    pub fn can_transition_to(self, next: OperationState) -> bool {
        use OperationState::*;
        matches!(
            (self, next),
            (Pending, Executing) | (Executing, Succeeded) | (Executing, Failed) | (Failed, Pending)
        )
    }

    /// 종료 상태 여부
    pub fn is_terminal(self) -> bool {
        matches!(self, OperationState::Succeeded | OperationState::Failed)
    }
}

impl fmt::Display for OperationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OperationState::Pending => "pending",
            OperationState::Executing => "executing",
            OperationState::Succeeded => "succeeded",
            OperationState::Failed => "failed",
        };
        write!(f, "{}", s)
    }
}

/// 상태 전이 기록
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StateChange {
    pub state: OperationState,
    pub at: DateTime<Utc>,
}

/// 추적 대상 작업
#[derive(Debug, Clone, Serialize)]
pub struct TrackedOperation {
    pub id: Uuid,
    pub name: String,
    state: OperationState,
    /// 실행 시작 횟수
    attempts: u32,
    /// 최대 실행 횟수 (초기 시도 포함)
    max_attempts: u32,
    last_error: Option<String>,
    history: Vec<StateChange>,
}

impl TrackedOperation {
    /// Pending 상태로 생성
    pub fn new(name: impl Into<String>, max_attempts: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            state: OperationState::Pending,
            attempts: 0,
            max_attempts: max_attempts.max(1),
            last_error: None,
            history: vec![StateChange {
                state: OperationState::Pending,
                at: Utc::now(),
            }],
        }
    }

    pub fn state(&self) -> OperationState {
        self.state
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn history(&self) -> &[StateChange] {
        &self.history
    }

    /// 상태 전이
    pub fn transition(&mut self, next: OperationState) -> Result<()> {
        if !self.state.can_transition_to(next) {
            return Err(ExecError::InvalidTransition {
                from: self.state,
                to: next,
            });
        }
        self.state = next;
        self.history.push(StateChange {
            state: next,
            at: Utc::now(),
        });
        Ok(())
    }

    /// Pending → Executing
    pub fn begin(&mut self) -> Result<()> {
        self.transition(OperationState::Executing)?;
        self.attempts += 1;
        Ok(())
    }

    /// Executing → Succeeded
    pub fn succeed(&mut self) -> Result<()> {
        self.transition(OperationState::Succeeded)
    }

    /// Executing → Failed
    pub fn fail(&mut self, error: &ExecError) -> Result<()> {
        self.transition(OperationState::Failed)?;
        self.last_error = Some(error.to_string());
        Ok(())
    }

    /// 재시도 가능 여부 (Failed이고 남은 시도가 있음)
    pub fn can_retry(&self) -> bool {
        self.state == OperationState::Failed && self.attempts < self.max_attempts
    }

    /// Failed → Pending (시도 한도 내에서만)
    pub fn retry(&mut self) -> Result<()> {
        if self.state == OperationState::Failed && !self.can_retry() {
            return Err(ExecError::InvalidTransition {
                from: self.state,
                to: OperationState::Pending,
            });
        }
        self.transition(OperationState::Pending)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path() {
        let mut op = TrackedOperation::new("create_products_table", 1);
        op.begin().unwrap();
        op.succeed().unwrap();

        assert_eq!(op.state(), OperationState::Succeeded);
        assert_eq!(op.attempts(), 1);
        let states: Vec<_> = op.history().iter().map(|c| c.state).collect();
        assert_eq!(
            states,
            vec![
                OperationState::Pending,
                OperationState::Executing,
                OperationState::Succeeded
            ]
        );
    }

    #[test]
    fn test_illegal_transitions_rejected() {
        let mut op = TrackedOperation::new("op", 3);
        assert!(matches!(
            op.succeed(),
            Err(ExecError::InvalidTransition {
                from: OperationState::Pending,
                to: OperationState::Succeeded
            })
        ));

        op.begin().unwrap();
        op.succeed().unwrap();
        // 성공 후 재시도 불가
        assert!(op.retry().is_err());
        assert!(op.begin().is_err());
    }

    #[test]
    fn test_retry_bounded_by_attempts() {
        let mut op = TrackedOperation::new("op", 2);
        let err = ExecError::transient("connection reset");

        op.begin().unwrap();
        op.fail(&err).unwrap();
        assert!(op.can_retry());
        op.retry().unwrap();

        op.begin().unwrap();
        op.fail(&err).unwrap();
        assert!(!op.can_retry());
        assert!(op.retry().is_err());
        assert_eq!(op.attempts(), 2);
        assert!(op.last_error().unwrap().contains("connection reset"));
    }
}
