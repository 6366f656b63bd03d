//! Dashboard list state.

use std::rc::Rc;

use shared::{EnvironmentBoard, EnvironmentId, EnvironmentRecord, StatusPair};
use yew::prelude::*;

pub enum BoardAction {
    Loaded(Vec<EnvironmentRecord>),
    LoadFailed(String),
    Added(EnvironmentRecord),
    Removed(EnvironmentId),
    Statuses(EnvironmentId, StatusPair),
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoardState {
    pub board: EnvironmentBoard,
    pub loading: bool,
    pub error: Option<String>,
}

impl Default for BoardState {
    fn default() -> Self {
        Self {
            board: EnvironmentBoard::default(),
            loading: true,
            error: None,
        }
    }
}

impl Reducible for BoardState {
    type Action = BoardAction;

    fn reduce(self: Rc<Self>, action: Self::Action) -> Rc<Self> {
        let mut next = (*self).clone();
        match action {
            BoardAction::Loaded(records) => {
                next.board = EnvironmentBoard::from_records(records);
                next.loading = false;
                next.error = None;
            }
            BoardAction::LoadFailed(message) => {
                next.loading = false;
                next.error = Some(message);
            }
            BoardAction::Added(record) => next.board.add(record.into()),
            BoardAction::Removed(id) => {
                if next.board.remove(id).is_none() {
                    return self;
                }
            }
            BoardAction::Statuses(id, statuses) => {
                if !next.board.update_statuses(id, statuses) {
                    return self;
                }
            }
        }
        Rc::new(next)
    }
}
