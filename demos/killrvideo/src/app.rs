//! The demo flow: users, logins, then a video and its views.

use std::io::Write;

use anyhow::{Context, ensure};

use crate::mapper::KillrVideoMapper;
use crate::user::{User, UserDao};
use crate::video::{Summary, Video, VideoSummary, day_bucket};

pub const EMAIL: &str = "testuser@example.com";
pub const PASSWORD: &str = "password123";
pub const WRONG_PASSWORD: &str = "secret123";
pub const TAG: &str = "apachecassandra";

/// # Errors
/// Returns any DAO or output error, or an error if a step finds the data in
/// an unexpected state.
pub async fn run_demo(
    mapper: &KillrVideoMapper,
    out: &mut (dyn Write + Send),
) -> anyhow::Result<()> {
    let users = mapper.user_dao().await?;
    let user = create_or_reuse_user(&users, out).await?;

    let duplicate = User::new("test2", "user", EMAIL);
    ensure!(
        !users.create(&duplicate, WRONG_PASSWORD).await?,
        "a second user was created with {EMAIL}"
    );

    try_login(&users, PASSWORD, out).await?;
    try_login(&users, WRONG_PASSWORD, out).await?;

    let videos = mapper.video_dao().await?;
    let video = videos.create(&new_video(&user)).await?;
    let videoid = video.videoid.context("created video has no id")?;
    writeln!(out, "Created video {}", Summary(&video))?;

    let userid = user.userid.context("user has no id")?;
    writeln!(
        out,
        "Videos for {} {}:",
        user.firstname.as_deref().unwrap_or_default(),
        user.lastname.as_deref().unwrap_or_default()
    )?;
    list(out, &videos.get_by_user(userid).await?)?;

    writeln!(out, "Latest videos:")?;
    list(out, &videos.get_latest(&day_bucket(chrono::Utc::now())).await?)?;

    writeln!(out, "Videos tagged with {TAG}:")?;
    list(out, &videos.get_by_tag(TAG).await?)?;

    let template = Video {
        videoid: Some(videoid),
        name: Some("Accelerate: A NoSQL Original Series - join us online!".to_owned()),
        ..Video::default()
    };
    videos.update(&template).await?;

    let updated = videos
        .get(videoid)
        .await?
        .with_context(|| format!("video {videoid} not found after update"))?;
    writeln!(
        out,
        "Updated name for video {videoid}: {}",
        updated.name().unwrap_or("null")
    )?;
    Ok(())
}

async fn create_or_reuse_user(
    users: &UserDao,
    out: &mut (dyn Write + Send),
) -> anyhow::Result<User> {
    let user = User::new("test", "user", EMAIL);
    if users.create(&user, PASSWORD).await? {
        writeln!(out, "Created {user}")?;
        return Ok(user);
    }
    let existing = users
        .get_by_email(EMAIL)
        .await?
        .with_context(|| format!("{EMAIL} is taken but has no user"))?;
    writeln!(out, "Reusing existing {existing}")?;
    Ok(existing)
}

async fn try_login(
    users: &UserDao,
    password: &str,
    out: &mut (dyn Write + Send),
) -> anyhow::Result<()> {
    let outcome = if users.login(EMAIL, password).await?.is_some() {
        "Success"
    } else {
        "Failure"
    };
    writeln!(out, "Logging in with {EMAIL}/{password}: {outcome}")?;
    Ok(())
}

fn new_video(user: &User) -> Video {
    Video {
        userid: user.userid,
        name: Some("Accelerate: A NoSQL Original Series (TRAILER)".to_owned()),
        location: Some("https://www.youtube.com/watch?v=LulWy8zmrog".to_owned()),
        tags: Some(
            [TAG, "nosql", "hybridcloud"]
                .into_iter()
                .map(str::to_owned)
                .collect(),
        ),
        ..Video::default()
    }
}

fn list<V: VideoSummary>(out: &mut (dyn Write + Send), videos: &[V]) -> std::io::Result<()> {
    for video in videos {
        writeln!(out, "  {}", Summary(video))?;
    }
    Ok(())
}
