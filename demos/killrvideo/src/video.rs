//! Videos and their denormalized views.
//!
//! `videos` is the source of truth. `user_videos`, `latest_videos` and
//! `videos_by_tag` copy a subset of its columns under other partition keys and
//! are written together with it in one logged batch.

use std::collections::HashSet;
use std::fmt;

use chrono::{DateTime, SubsecRound, Utc};
use cql_mapper::value::BoundValue;
use cql_mapper::{Entity, EntityDao, MapperContext, NullSavingStrategy};
use scylla::statement::batch::{Batch, BatchType};
use tracing::info;
use uuid::Uuid;

use crate::OrNull;
use crate::error::KillrVideoError;

#[derive(Debug, Clone, Default, PartialEq, Eq, Entity)]
#[entity(table = "videos")]
pub struct Video {
    #[entity(partition_key)]
    pub videoid: Option<Uuid>,
    pub userid: Option<Uuid>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub location_type: Option<i32>,
    pub preview_image_location: Option<String>,
    pub tags: Option<HashSet<String>>,
    pub added_date: Option<DateTime<Utc>>,
}

/// Videos of one user, newest first.
#[derive(Debug, Clone, PartialEq, Eq, Entity)]
#[entity(table = "user_videos")]
pub struct UserVideo {
    #[entity(partition_key)]
    pub userid: Uuid,
    #[entity(clustering_column = 0)]
    pub added_date: DateTime<Utc>,
    #[entity(clustering_column = 1)]
    pub videoid: Uuid,
    pub name: Option<String>,
    pub preview_image_location: Option<String>,
}

/// Videos added on one UTC day, newest first.
#[derive(Debug, Clone, PartialEq, Eq, Entity)]
#[entity(table = "latest_videos")]
pub struct LatestVideo {
    #[entity(partition_key)]
    pub yyyymmdd: String,
    #[entity(clustering_column = 0)]
    pub added_date: DateTime<Utc>,
    #[entity(clustering_column = 1)]
    pub videoid: Uuid,
    pub userid: Uuid,
    pub name: Option<String>,
    pub preview_image_location: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Entity)]
#[entity(table = "videos_by_tag")]
pub struct VideoByTag {
    #[entity(partition_key)]
    pub tag: String,
    #[entity(clustering_column)]
    pub videoid: Uuid,
    pub added_date: Option<DateTime<Utc>>,
    pub userid: Option<Uuid>,
    pub name: Option<String>,
    pub preview_image_location: Option<String>,
    pub tagged_date: Option<DateTime<Utc>>,
}

/// One-line listing: `[videoid] name`.
pub trait VideoSummary {
    fn videoid(&self) -> Option<Uuid>;
    fn name(&self) -> Option<&str>;
}

macro_rules! video_summary {
    ($($ty:ty),+) => {$(
        impl VideoSummary for $ty {
            fn videoid(&self) -> Option<Uuid> {
                Some(self.videoid)
            }

            fn name(&self) -> Option<&str> {
                self.name.as_deref()
            }
        }
    )+};
}

video_summary!(UserVideo, LatestVideo, VideoByTag);

impl VideoSummary for Video {
    fn videoid(&self) -> Option<Uuid> {
        self.videoid
    }

    fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

/// Renders a [`VideoSummary`] as `[videoid] name`.
pub struct Summary<'a, V>(pub &'a V);

impl<V: VideoSummary> fmt::Display for Summary<'_, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}",
            OrNull(&self.0.videoid()),
            self.0.name().unwrap_or("null")
        )
    }
}

/// Partition key of `latest_videos` for the day of `timestamp`, e.g. `20240131`.
#[must_use]
pub fn day_bucket(timestamp: DateTime<Utc>) -> String {
    timestamp.format("%Y%m%d").to_string()
}

/// Rows written for one new video.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Denormalized {
    pub video: Video,
    pub user_video: UserVideo,
    pub latest_video: LatestVideo,
    pub by_tag: Vec<VideoByTag>,
}

impl Denormalized {
    /// Fills `videoid` and `added_date` when missing and derives every view row.
    ///
    /// # Errors
    /// Returns `KillrVideoError::MissingVideoOwner` if the video has no `userid`.
    pub fn of(video: &Video) -> Result<Self, KillrVideoError> {
        let mut video = video.clone();
        let videoid = *video.videoid.get_or_insert_with(Uuid::new_v4);
        // CQL timestamps keep milliseconds only
        let added_date = *video
            .added_date
            .get_or_insert_with(|| Utc::now().trunc_subsecs(3));
        let userid = video
            .userid
            .ok_or(KillrVideoError::MissingVideoOwner { videoid })?;

        let user_video = UserVideo {
            userid,
            added_date,
            videoid,
            name: video.name.clone(),
            preview_image_location: video.preview_image_location.clone(),
        };
        let latest_video = LatestVideo {
            yyyymmdd: day_bucket(added_date),
            added_date,
            videoid,
            userid,
            name: video.name.clone(),
            preview_image_location: video.preview_image_location.clone(),
        };
        let mut tags: Vec<&String> = video.tags.iter().flatten().collect();
        tags.sort();
        let by_tag = tags
            .into_iter()
            .map(|tag| VideoByTag {
                tag: tag.clone(),
                videoid,
                added_date: Some(added_date),
                userid: Some(userid),
                name: video.name.clone(),
                preview_image_location: video.preview_image_location.clone(),
                tagged_date: Some(added_date),
            })
            .collect();

        Ok(Self {
            video,
            user_video,
            latest_video,
            by_tag,
        })
    }
}

pub struct VideoDao {
    videos: EntityDao<Video>,
    user_videos: EntityDao<UserVideo>,
    latest_videos: EntityDao<LatestVideo>,
    videos_by_tag: EntityDao<VideoByTag>,
}

impl VideoDao {
    /// # Errors
    /// Returns an error if a statement cannot be prepared.
    pub async fn new(context: &MapperContext) -> cql_mapper::Result<Self> {
        Ok(Self {
            videos: EntityDao::new(context).await?,
            user_videos: EntityDao::new(context).await?,
            latest_videos: EntityDao::new(context).await?,
            videos_by_tag: EntityDao::new(context).await?,
        })
    }

    /// # Errors
    /// Returns an error if the request fails.
    pub async fn get(&self, videoid: Uuid) -> Result<Option<Video>, KillrVideoError> {
        Ok(self.videos.get((videoid,)).await?)
    }

    /// # Errors
    /// Returns an error if the request fails.
    pub async fn get_by_user(&self, userid: Uuid) -> Result<Vec<UserVideo>, KillrVideoError> {
        Ok(self.user_videos.select_partition((userid,)).await?)
    }

    /// # Errors
    /// Returns an error if the request fails.
    pub async fn get_latest(&self, yyyymmdd: &str) -> Result<Vec<LatestVideo>, KillrVideoError> {
        Ok(self.latest_videos.select_partition((yyyymmdd,)).await?)
    }

    /// # Errors
    /// Returns an error if the request fails.
    pub async fn get_by_tag(&self, tag: &str) -> Result<Vec<VideoByTag>, KillrVideoError> {
        Ok(self.videos_by_tag.select_partition((tag,)).await?)
    }

    /// Writes the video and all its views in one logged batch.
    ///
    /// Returns the stored video, with `videoid` and `added_date` filled in.
    ///
    /// # Errors
    /// Returns an error if the video has no owner or the batch fails.
    #[tracing::instrument(level = "debug", skip_all)]
    pub async fn create(&self, video: &Video) -> Result<Video, KillrVideoError> {
        let rows = Denormalized::of(video)?;
        let strategy = NullSavingStrategy::DoNotSet;

        let mut batch = Batch::new(BatchType::Logged);
        let mut values: Vec<Vec<BoundValue>> = Vec::with_capacity(3 + rows.by_tag.len());

        batch.append_statement(self.videos.insert_statement().clone());
        values.push(self.videos.bind_insert_with(&rows.video, strategy)?);
        batch.append_statement(self.user_videos.insert_statement().clone());
        values.push(self.user_videos.bind_insert_with(&rows.user_video, strategy)?);
        batch.append_statement(self.latest_videos.insert_statement().clone());
        values.push(
            self.latest_videos
                .bind_insert_with(&rows.latest_video, strategy)?,
        );
        for by_tag in &rows.by_tag {
            batch.append_statement(self.videos_by_tag.insert_statement().clone());
            values.push(self.videos_by_tag.bind_insert_with(by_tag, strategy)?);
        }

        self.videos.session().batch(&batch, values).await?;
        info!(
            videoid = %OrNull(&rows.video.videoid),
            tags = rows.by_tag.len(),
            "video created"
        );
        Ok(rows.video)
    }

    /// Sets every non-null field of `template` on the row with its `videoid`.
    ///
    /// # Errors
    /// Returns an error if `videoid` is missing or the request fails.
    pub async fn update(&self, template: &Video) -> Result<(), KillrVideoError> {
        Ok(self
            .videos
            .update(template, NullSavingStrategy::DoNotSet)
            .await?)
    }
}
