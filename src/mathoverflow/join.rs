/*! Joining posts with their comments and answers.

Posts are read in a single pass. Questions and answers are collected first,
then answers are grouped by parent and attached to their question, highest score first.
!*/
use std::cmp::Reverse;
use std::collections::BTreeMap;

use itertools::Itertools;
use log::{debug, info, warn};

use super::decode::FromRow;
use super::index::CommentIndex;
use super::rows::Row;
use super::types::{Post, PostType};
use crate::error::Error;

/// Result of a join.
#[derive(Debug, Default)]
pub struct Import {
    /// Questions by id, with nested comments and answers.
    pub questions: BTreeMap<i64, Post>,
    /// Answers whose parent question is not in the dump, sorted by id.
    /// They are not attached to any question.
    pub orphans: Vec<Post>,
    /// Number of posts that are neither questions nor answers.
    pub skipped: usize,
}

impl Import {
    /// Number of answers attached to a question.
    pub fn nb_answers(&self) -> usize {
        self.questions
            .values()
            .filter_map(|q| q.answers.as_ref())
            .map(Vec::len)
            .sum()
    }
}

/// Decode posts from `rows` and join them with `comments`.
pub fn join<I>(rows: I, comments: CommentIndex) -> Result<Import, Error>
where
    I: IntoIterator<Item = Result<Row, Error>>,
{
    let mut questions = BTreeMap::new();
    let mut answers = Vec::new();
    let mut skipped = 0;

    for row in rows {
        let mut post = Post::from_row(&row?)?;
        post.comments = comments.get(post.id).to_vec();
        match post.post_type {
            PostType::Question => {
                post.answers = Some(Vec::new());
                questions.insert(post.id, post);
            }
            PostType::Answer => answers.push(post),
            _ => skipped += 1,
        }
    }

    let nb_answers = answers.len();
    let mut orphans = Vec::new();
    for (parent_id, mut group) in answers.into_iter().into_group_map_by(|a| a.parent_id) {
        group.sort_by_key(|a| Reverse(a.score));
        match parent_id.and_then(|id| questions.get_mut(&id)) {
            Some(question) => question.answers = Some(group),
            None => orphans.extend(group),
        }
    }
    orphans.sort_by_key(|a| a.id);

    info!(
        "Processed {} questions with {} answers.",
        questions.len(),
        nb_answers
    );
    if !orphans.is_empty() {
        warn!(
            "{} answers have no parent question in the dump and were left out",
            orphans.len()
        );
        debug!(
            "orphaned answers: {:?}",
            orphans.iter().map(|a| a.id).collect::<Vec<_>>()
        );
    }
    debug!("skipped {} posts of other types", skipped);

    Ok(Import {
        questions,
        orphans,
        skipped,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mathoverflow::types::Comment;

    fn post(id: i64, post_type: i64, parent: Option<i64>, score: i64) -> Result<Row, Error> {
        let mut row: Row = vec![
            ("Id", id.to_string()),
            ("PostTypeId", post_type.to_string()),
            ("CreationDate", "2011-03-01T10:00:00.000".to_string()),
            ("Score", score.to_string()),
            ("Body", format!("<p>post {}</p>", id)),
        ]
        .into_iter()
        .collect();
        if let Some(p) = parent {
            row.insert("ParentId", p.to_string());
        }
        Ok(row)
    }

    fn comment(id: i64, post_id: i64, score: i64) -> Result<Row, Error> {
        Ok(vec![
            ("Id", id.to_string()),
            ("PostId", post_id.to_string()),
            ("Score", score.to_string()),
            ("Text", format!("comment {}", id)),
            ("CreationDate", "2011-03-01T11:00:00.000".to_string()),
        ]
        .into_iter()
        .collect())
    }

    fn index(rows: Vec<Result<Row, Error>>) -> CommentIndex {
        CommentIndex::from_rows(rows).unwrap()
    }

    #[test]
    fn question_with_answer_and_comment() {
        let comments = index(vec![comment(1, 10, 3)]);
        let import = join(vec![post(10, 1, None, 0), post(11, 2, Some(10), 5)], comments).unwrap();

        assert_eq!(import.questions.len(), 1);
        let q = &import.questions[&10];
        let scores: Vec<i64> = q.comments.iter().map(|c: &Comment| c.score).collect();
        assert_eq!(scores, vec![3]);
        let answers = q.answers.as_ref().unwrap();
        assert_eq!(answers.len(), 1);
        assert_eq!(answers[0].id, 11);
        assert_eq!(answers[0].score, 5);
        assert!(answers[0].answers.is_none());
        assert!(import.orphans.is_empty());
    }

    #[test]
    fn answers_sorted_by_descending_score() {
        let import = join(
            vec![
                post(10, 1, None, 0),
                post(11, 2, Some(10), 5),
                post(12, 2, Some(10), 9),
            ],
            CommentIndex::default(),
        )
        .unwrap();
        let scores: Vec<i64> = import.questions[&10]
            .answers
            .as_ref()
            .unwrap()
            .iter()
            .map(|a| a.score)
            .collect();
        assert_eq!(scores, vec![9, 5]);
        assert_eq!(import.nb_answers(), 2);
    }

    #[test]
    fn answer_ties_keep_dump_order() {
        let import = join(
            vec![
                post(10, 1, None, 0),
                post(13, 2, Some(10), 2),
                post(11, 2, Some(10), 2),
                post(12, 2, Some(10), 4),
            ],
            CommentIndex::default(),
        )
        .unwrap();
        let ids: Vec<i64> = import.questions[&10]
            .answers
            .as_ref()
            .unwrap()
            .iter()
            .map(|a| a.id)
            .collect();
        assert_eq!(ids, vec![12, 13, 11]);
    }

    #[test]
    fn answer_before_its_question() {
        let import = join(
            vec![post(11, 2, Some(10), 1), post(10, 1, None, 0)],
            CommentIndex::default(),
        )
        .unwrap();
        assert_eq!(import.questions[&10].answers.as_ref().unwrap().len(), 1);
    }

    #[test]
    fn lonely_question_has_empty_sequences() {
        let import = join(vec![post(10, 1, None, 0)], CommentIndex::default()).unwrap();
        let q = &import.questions[&10];
        assert!(q.comments.is_empty());
        assert_eq!(q.answers, Some(vec![]));
    }

    #[test]
    fn orphaned_answers_are_reported_not_attached() {
        let import = join(
            vec![
                post(10, 1, None, 0),
                post(21, 2, Some(99), 1),
                post(20, 2, None, 1),
            ],
            CommentIndex::default(),
        )
        .unwrap();
        assert_eq!(import.questions[&10].answers, Some(vec![]));
        let orphans: Vec<i64> = import.orphans.iter().map(|a| a.id).collect();
        assert_eq!(orphans, vec![20, 21]);
    }

    #[test]
    fn other_post_types_are_skipped() {
        let import = join(
            vec![post(10, 1, None, 0), post(30, 5, None, 0), post(31, 4, None, 0)],
            CommentIndex::default(),
        )
        .unwrap();
        assert_eq!(import.questions.len(), 1);
        assert_eq!(import.skipped, 2);
    }

    #[test]
    fn answers_get_their_comments() {
        let comments = index(vec![comment(1, 11, 0), comment(2, 11, 4), comment(3, 10, 1)]);
        let import = join(vec![post(10, 1, None, 0), post(11, 2, Some(10), 5)], comments).unwrap();
        let answer = &import.questions[&10].answers.as_ref().unwrap()[0];
        let ids: Vec<i64> = answer.comments.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![2, 1]);
    }

    #[test]
    fn repeated_post_id_keeps_its_comments() {
        let comments = index(vec![comment(1, 11, 0)]);
        let import = join(
            vec![
                post(10, 1, None, 0),
                post(11, 2, Some(10), 5),
                post(11, 2, Some(10), 5),
            ],
            comments,
        )
        .unwrap();
        let answers = import.questions[&10].answers.as_ref().unwrap();
        assert_eq!(answers.len(), 2);
        assert!(answers.iter().all(|a| a.comments.len() == 1));
    }

    #[test]
    fn decode_error_aborts() {
        let mut bad = post(11, 2, Some(10), 5).unwrap();
        bad.remove("Score");
        let res = join(vec![post(10, 1, None, 0), Ok(bad)], CommentIndex::default());
        assert!(matches!(res, Err(Error::MissingField("Score"))));
    }
}
