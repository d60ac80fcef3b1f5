use ivory_domain::notes::is_black_key;
use ivory_domain::NoteRange;
use serde::{Deserialize, Serialize};

/// What the keyboard needs from whoever runs the exercise.
pub trait TrainerContext {
    fn next_target_note(&self) -> Option<u8>;
    fn increment_correct(&mut self);
}

/// Walks through a fixed list of target notes, counting correct plays.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PracticeSession {
    targets: Vec<u8>,
    current_index: usize,
    correct: u32,
}

impl PracticeSession {
    pub fn new(targets: Vec<u8>) -> Self {
        Self {
            targets,
            current_index: 0,
            correct: 0,
        }
    }

    /// Every white key of `range`, bottom to top.
    pub fn white_keys(range: &NoteRange) -> Self {
        Self::new(range.notes().filter(|note| !is_black_key(*note)).collect())
    }

    pub fn correct_count(&self) -> u32 {
        self.correct
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    pub fn reset(&mut self) {
        self.current_index = 0;
        self.correct = 0;
    }
}

impl TrainerContext for PracticeSession {
    fn next_target_note(&self) -> Option<u8> {
        self.targets.get(self.current_index).copied()
    }

    fn increment_correct(&mut self) {
        self.correct += 1;
        if !self.targets.is_empty() {
            self.current_index = (self.current_index + 1) % self.targets.len();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_advances_and_wraps() {
        let mut session = PracticeSession::new(vec![60, 62]);
        assert_eq!(session.next_target_note(), Some(60));
        session.increment_correct();
        assert_eq!(session.next_target_note(), Some(62));
        session.increment_correct();
        assert_eq!(session.next_target_note(), Some(60));
        assert_eq!(session.correct_count(), 2);
        session.reset();
        assert_eq!(session.correct_count(), 0);
        assert_eq!(session.current_index(), 0);
    }

    #[test]
    fn white_keys_of_practice_range() {
        let session = PracticeSession::white_keys(&NoteRange::practice());
        assert_eq!(session.len(), 15);
        assert_eq!(session.next_target_note(), Some(48));
    }

    #[test]
    fn empty_session_has_no_target() {
        let mut session = PracticeSession::new(Vec::new());
        assert!(session.is_empty());
        session.increment_correct();
        assert_eq!(session.next_target_note(), None);
    }
}
