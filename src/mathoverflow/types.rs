/*! Stack Exchange records.

Field names follow the public data dump schema (`https://meta.stackexchange.com/questions/2677`),
and are serialized back with their dump names.
!*/
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::decode::{FromAttr, FromRow};
use super::rows::Row;
use crate::error::Error;

/// Kind of a post, stored as `PostTypeId` in dumps.
///
/// Serialized as its numeric code, like in the dump.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "i64", try_from = "i64")]
pub enum PostType {
    Question,
    Answer,
    OrphanedTagWiki,
    TagWikiExcerpt,
    TagWiki,
    ModeratorNomination,
    WikiPlaceholder,
    PrivilegeWiki,
}

impl PostType {
    pub fn from_code(code: i64) -> Result<Self, Error> {
        match code {
            1 => Ok(Self::Question),
            2 => Ok(Self::Answer),
            3 => Ok(Self::OrphanedTagWiki),
            4 => Ok(Self::TagWikiExcerpt),
            5 => Ok(Self::TagWiki),
            6 => Ok(Self::ModeratorNomination),
            7 => Ok(Self::WikiPlaceholder),
            8 => Ok(Self::PrivilegeWiki),
            other => Err(Error::UnknownPostType(other)),
        }
    }

    pub fn code(&self) -> i64 {
        match self {
            Self::Question => 1,
            Self::Answer => 2,
            Self::OrphanedTagWiki => 3,
            Self::TagWikiExcerpt => 4,
            Self::TagWiki => 5,
            Self::ModeratorNomination => 6,
            Self::WikiPlaceholder => 7,
            Self::PrivilegeWiki => 8,
        }
    }
}

impl From<PostType> for i64 {
    fn from(post_type: PostType) -> Self {
        post_type.code()
    }
}

impl TryFrom<i64> for PostType {
    type Error = Error;

    fn try_from(code: i64) -> Result<Self, Error> {
        Self::from_code(code)
    }
}

impl FromAttr for PostType {
    fn from_attr(field: &'static str, raw: &str) -> Result<Self, Error> {
        Self::from_code(i64::from_attr(field, raw)?)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Comment {
    pub id: i64,
    pub post_id: i64,
    pub score: i64,
    pub text: String,
    pub creation_date: NaiveDateTime,
    pub user_id: Option<i64>,
}

impl FromRow for Comment {
    fn from_row(row: &Row) -> Result<Self, Error> {
        Ok(Self {
            id: row.required("Id")?,
            post_id: row.required("PostId")?,
            score: row.required("Score")?,
            text: row.required("Text")?,
            creation_date: row.required("CreationDate")?,
            user_id: row.optional("UserId")?,
        })
    }
}

/// A question, an answer or any other kind of post.
///
/// `comments` and `answers` are not part of the dump: they are filled in by [crate::mathoverflow::join].
/// `answers` is only ever `Some` for joined questions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Post {
    pub id: i64,
    pub creation_date: NaiveDateTime,
    pub deletion_date: Option<NaiveDateTime>,
    pub score: i64,
    pub body: String,
    pub title: Option<String>,
    pub owner_user_id: Option<i64>,
    pub view_count: Option<i64>,
    pub accepted_answer_id: Option<i64>,
    pub parent_id: Option<i64>,
    #[serde(rename = "PostTypeId")]
    pub post_type: PostType,
    pub tags: String,
    #[serde(default)]
    pub comments: Vec<Comment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answers: Option<Vec<Post>>,
}

impl Post {
    pub fn is_question(&self) -> bool {
        self.post_type == PostType::Question
    }

    pub fn is_answer(&self) -> bool {
        self.post_type == PostType::Answer
    }
}

impl FromRow for Post {
    fn from_row(row: &Row) -> Result<Self, Error> {
        Ok(Self {
            id: row.required("Id")?,
            creation_date: row.required("CreationDate")?,
            deletion_date: row.optional("DeletionDate")?,
            score: row.required("Score")?,
            body: row.required("Body")?,
            title: row.optional("Title")?,
            owner_user_id: row.optional("OwnerUserId")?,
            view_count: row.optional("ViewCount")?,
            accepted_answer_id: row.optional("AcceptedAnswerId")?,
            parent_id: row.optional("ParentId")?,
            post_type: row.with("PostTypeId", |raw| {
                PostType::from_attr("PostTypeId", raw)
            })?,
            tags: row.or("Tags", String::new())?,
            comments: Vec::new(),
            answers: None,
        })
    }
}
