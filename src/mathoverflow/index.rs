/*! Comments grouped by the post they belong to.

Grouping needs every comment, so the whole comment dump is materialized before posts are read.
!*/
use std::cmp::Reverse;
use std::collections::HashMap;

use itertools::Itertools;
use log::info;

use super::decode::FromRow;
use super::rows::Row;
use super::types::Comment;
use crate::error::Error;

/// Post id -> comments of that post, highest score first.
///
/// Comments with the same score keep their dump order.
#[derive(Debug, Default)]
pub struct CommentIndex {
    by_post: HashMap<i64, Vec<Comment>>,
}

impl CommentIndex {
    pub fn build<I>(comments: I) -> Self
    where
        I: IntoIterator<Item = Comment>,
    {
        let mut by_post = comments.into_iter().into_group_map_by(|c| c.post_id);
        for group in by_post.values_mut() {
            // stable, so ties stay in encounter order
            group.sort_by_key(|c| Reverse(c.score));
        }
        Self { by_post }
    }

    /// Decode every row as a [Comment] and index them.
    pub fn from_rows<I>(rows: I) -> Result<Self, Error>
    where
        I: IntoIterator<Item = Result<Row, Error>>,
    {
        let comments: Vec<Comment> = rows
            .into_iter()
            .map(|row| Comment::from_row(&row?))
            .collect::<Result<_, _>>()?;
        info!("Processed {} comments.", comments.len());
        Ok(Self::build(comments))
    }

    pub fn get(&self, post_id: i64) -> &[Comment] {
        self.by_post.get(&post_id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of posts having at least one comment.
    pub fn len(&self) -> usize {
        self.by_post.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_post.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn comment(id: i64, post_id: i64, score: i64) -> Comment {
        Comment {
            id,
            post_id,
            score,
            text: format!("comment {}", id),
            creation_date: NaiveDate::from_ymd_opt(2010, 1, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
            user_id: None,
        }
    }

    #[test]
    fn groups_by_post() {
        // interleaved on purpose: grouping must not depend on adjacency
        let index = CommentIndex::build(vec![
            comment(1, 10, 0),
            comment(2, 11, 0),
            comment(3, 10, 0),
        ]);
        assert_eq!(index.len(), 2);
        let ids: Vec<i64> = index.get(10).iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![1, 3]);
        assert_eq!(index.get(11).len(), 1);
    }

    #[test]
    fn sorted_by_descending_score_stable() {
        let index = CommentIndex::build(vec![
            comment(1, 10, 1),
            comment(2, 10, 5),
            comment(3, 10, 1),
            comment(4, 10, 7),
            comment(5, 10, 5),
        ]);
        let got: Vec<(i64, i64)> = index.get(10).iter().map(|c| (c.score, c.id)).collect();
        assert_eq!(got, vec![(7, 4), (5, 2), (5, 5), (1, 1), (1, 3)]);
        assert!(index.get(10).windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[test]
    fn unknown_post_is_empty() {
        let index = CommentIndex::build(vec![comment(1, 10, 1)]);
        assert!(index.get(99).is_empty());
        assert_eq!(index.get(10).len(), 1);
        assert_eq!(index.get(10).len(), 1);
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn from_rows_propagates_decode_errors() {
        let rows: Vec<Result<Row, Error>> = vec![Ok(vec![("Id", "1")].into_iter().collect())];
        assert!(matches!(
            CommentIndex::from_rows(rows),
            Err(Error::MissingField("PostId"))
        ));
    }
}
