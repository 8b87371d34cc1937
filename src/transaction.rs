//! Transaction state machine
//!
//! Transactions are an explicit stack of frames. Each frame carries its state
//! and the undo log of the mutations made while it was the innermost frame.
//!
//! - Committing a nested frame merges its undo log into the parent, so the
//!   changes only become final when the root commits.
//! - Rolling back a nested frame undoes its changes right away and marks the
//!   parent rollback-only; committing that parent then rolls it back instead.
//!
//! The stack never touches the graph itself. `prepare_*` hands the caller the
//! undo operations to apply, and `finish` resolves the frame afterwards.

use crate::error::{GraphError, GraphResult};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransactionState {
    Running,
    /// A nested transaction is open on top of this one
    NestedTransaction,
    Committing,
    Committed,
    RollingBack,
    RolledBack,
}

impl TransactionState {
    /// Whether the graph accepts mutations in this state
    pub fn accepts_mutation(self) -> bool {
        matches!(
            self,
            TransactionState::Running | TransactionState::NestedTransaction
        )
    }
}

impl fmt::Display for TransactionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[derive(Debug)]
struct Frame<U> {
    state: TransactionState,
    undo: Vec<U>,
    rollback_only: bool,
}

impl<U> Frame<U> {
    fn new() -> Self {
        Frame {
            state: TransactionState::Running,
            undo: Vec::new(),
            rollback_only: false,
        }
    }
}

/// Stack of open transactions, generic over the undo operation type
#[derive(Debug)]
pub struct TransactionStack<U> {
    frames: Vec<Frame<U>>,
    last_outcome: Option<TransactionState>,
}

impl<U> Default for TransactionStack<U> {
    fn default() -> Self {
        Self::new()
    }
}

impl<U> TransactionStack<U> {
    pub fn new() -> Self {
        TransactionStack {
            frames: Vec::new(),
            last_outcome: None,
        }
    }

    /// Number of open frames
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn is_active(&self) -> bool {
        !self.frames.is_empty()
    }

    /// State of the innermost open frame; `None` once every frame is closed
    pub fn state(&self) -> Option<TransactionState> {
        self.frames.last().map(|f| f.state)
    }

    /// How the most recently closed frame ended (`Committed` or `RolledBack`)
    pub fn last_outcome(&self) -> Option<TransactionState> {
        self.last_outcome
    }

    /// Whether the innermost frame will roll back on commit
    pub fn is_rollback_only(&self) -> bool {
        self.frames.last().map_or(false, |f| f.rollback_only)
    }

    /// Open a root transaction
    pub fn begin(&mut self) -> GraphResult<usize> {
        if self.is_active() {
            return Err(GraphError::IllegalState(
                "a transaction is already running; begin a nested transaction instead".to_string(),
            ));
        }
        self.frames.push(Frame::new());
        Ok(self.frames.len())
    }

    /// Open a transaction nested in the innermost running one
    pub fn begin_nested(&mut self) -> GraphResult<usize> {
        let parent = self.frames.last_mut().ok_or_else(|| {
            GraphError::IllegalState("no transaction to nest into".to_string())
        })?;
        if parent.state != TransactionState::Running {
            return Err(GraphError::IllegalState(format!(
                "cannot nest into a transaction in state {}",
                parent.state
            )));
        }
        parent.state = TransactionState::NestedTransaction;
        self.frames.push(Frame::new());
        Ok(self.frames.len())
    }

    /// Fails with `IllegalState` unless mutations are currently accepted.
    /// Outside any transaction every mutation auto-commits.
    pub fn check_writable(&self) -> GraphResult<()> {
        match self.frames.last() {
            Some(frame) if !frame.state.accepts_mutation() => Err(GraphError::IllegalState(
                format!("cannot mutate the graph in transaction state {}", frame.state),
            )),
            _ => Ok(()),
        }
    }

    /// Log an undo operation against the innermost frame (dropped when none is open)
    pub fn record(&mut self, op: U) {
        if let Some(frame) = self.frames.last_mut() {
            frame.undo.push(op);
        }
    }

    /// Start committing the innermost frame.
    ///
    /// Returns `None` when the commit can proceed, or the undo log (oldest
    /// first) when the frame is rollback-only and must be undone instead.
    pub fn prepare_commit(&mut self) -> GraphResult<Option<Vec<U>>> {
        let frame = self.running_frame("commit")?;
        if frame.rollback_only {
            frame.state = TransactionState::RollingBack;
            Ok(Some(std::mem::take(&mut frame.undo)))
        } else {
            frame.state = TransactionState::Committing;
            Ok(None)
        }
    }

    /// Start rolling back the innermost frame, returning its undo log (oldest first)
    pub fn prepare_rollback(&mut self) -> GraphResult<Vec<U>> {
        let frame = self.running_frame("roll back")?;
        frame.state = TransactionState::RollingBack;
        Ok(std::mem::take(&mut frame.undo))
    }

    /// Close the innermost frame after `prepare_*` and resolve it into its parent
    pub fn finish(&mut self) -> Option<TransactionState> {
        let frame = self.frames.pop()?;
        let outcome = match frame.state {
            TransactionState::Committing => TransactionState::Committed,
            _ => TransactionState::RolledBack,
        };
        if let Some(parent) = self.frames.last_mut() {
            parent.state = TransactionState::Running;
            match outcome {
                TransactionState::Committed => parent.undo.extend(frame.undo),
                _ => parent.rollback_only = true,
            }
        }
        self.last_outcome = Some(outcome);
        Some(outcome)
    }

    fn running_frame(&mut self, action: &str) -> GraphResult<&mut Frame<U>> {
        let frame = self.frames.last_mut().ok_or_else(|| {
            GraphError::IllegalState(format!("no transaction to {}", action))
        })?;
        if frame.state != TransactionState::Running {
            return Err(GraphError::IllegalState(format!(
                "cannot {} a transaction in state {}",
                action, frame.state
            )));
        }
        Ok(frame)
    }
}
