//! Grouping of recording samples into sessions and shots.
//!
//! A recording file for one stimulus interleaves every session that looked
//! at it. Samples are grouped by session, then by shot, keeping the order in
//! which sessions and shots first appear and the file order of samples.

use crate::recording::types::{GazeSample, ShotSample};
use std::collections::HashMap;

/// Number of leading session-id characters that name the participant.
const PARTICIPANT_PREFIX_LEN: usize = 2;

/// Extract the participant id from a session id.
pub fn participant_of(session: &str) -> &str {
    match session.char_indices().nth(PARTICIPANT_PREFIX_LEN) {
        Some((idx, _)) => &session[..idx],
        None => session,
    }
}

/// All samples recorded during one shot of one session.
#[derive(Debug, Clone, PartialEq)]
pub struct ShotGroup<T> {
    pub session: String,
    pub shot: u32,
    pub samples: Vec<T>,
}

impl<T> ShotGroup<T> {
    pub fn participant(&self) -> &str {
        participant_of(&self.session)
    }
}

impl ShotGroup<GazeSample> {
    pub fn timestamps(&self) -> Vec<i64> {
        self.samples.iter().map(|s| s.timestamp).collect()
    }

    pub fn xs(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.x).collect()
    }

    pub fn ys(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.y).collect()
    }
}

/// Group samples by (session, shot) preserving first-appearance order.
///
/// Shots of the same session stay adjacent, in the order they first appear
/// within that session.
pub fn group_by_shot<T: ShotSample>(samples: Vec<T>) -> Vec<ShotGroup<T>> {
    let mut sessions: Vec<(String, Vec<ShotGroup<T>>)> = Vec::new();
    let mut session_index: HashMap<String, usize> = HashMap::new();
    let mut shot_index: HashMap<(usize, u32), usize> = HashMap::new();

    for sample in samples {
        let session_pos = match session_index.get(sample.session()) {
            Some(&pos) => pos,
            None => {
                let session = sample.session().to_string();
                sessions.push((session.clone(), Vec::new()));
                session_index.insert(session, sessions.len() - 1);
                sessions.len() - 1
            }
        };

        let shot = sample.shot();
        let shots = &mut sessions[session_pos].1;
        let shot_pos = *shot_index.entry((session_pos, shot)).or_insert_with(|| {
            shots.push(ShotGroup {
                session: sample.session().to_string(),
                shot,
                samples: Vec::new(),
            });
            shots.len() - 1
        });

        shots[shot_pos].samples.push(sample);
    }

    sessions
        .into_iter()
        .flat_map(|(_, shots)| shots)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_participant_prefix() {
        assert_eq!(participant_of("p1_2019-07-22"), "p1");
        assert_eq!(participant_of("p"), "p");
        assert_eq!(participant_of(""), "");
    }

    #[test]
    fn test_grouping_preserves_first_appearance_order() {
        let samples = vec![
            GazeSample::new("p2_x", 1, 0, 0.0, 0.0),
            GazeSample::new("p1_y", 0, 5, 1.0, 1.0),
            GazeSample::new("p2_x", 0, 10, 2.0, 2.0),
            GazeSample::new("p2_x", 1, 15, 3.0, 3.0),
            GazeSample::new("p1_y", 0, 20, 4.0, 4.0),
        ];

        let groups = group_by_shot(samples);
        let keys: Vec<(&str, u32, usize)> = groups
            .iter()
            .map(|g| (g.session.as_str(), g.shot, g.samples.len()))
            .collect();
        assert_eq!(keys, vec![("p2_x", 1, 2), ("p2_x", 0, 1), ("p1_y", 0, 2)]);
        assert_eq!(groups[0].timestamps(), vec![0, 15]);
        assert_eq!(groups[2].xs(), vec![1.0, 4.0]);
        assert_eq!(groups[2].participant(), "p1");
    }

    #[test]
    fn test_empty_input() {
        let groups: Vec<ShotGroup<GazeSample>> = group_by_shot(Vec::new());
        assert!(groups.is_empty());
    }
}
