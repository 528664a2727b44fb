use crate::libprep::content::{ArticleEntry, Cadence, ContentPack, TaskEntry};
use crate::libprep::db::{CompletedTask, UnlockedArticle};
use crate::libprep::error::Error;
use crate::libprep::wallet::Wallet;
use log::info;
use rusqlite::Connection;

/// Credits a task's reward the first time it is completed.
pub fn complete_task<'a>(
    conn: &Connection,
    pack: &'a ContentPack,
    wallet: &mut Wallet,
    task_id: &str,
) -> Result<&'a TaskEntry, Error> {
    let task = pack
        .task(task_id)
        .ok_or_else(|| Error::UnknownTask(task_id.to_string()))?;
    if CompletedTask::exists(conn, &task.id)? {
        return Err(Error::TaskAlreadyCompleted);
    }
    wallet.reward(conn, task.reward, |tx| CompletedTask::add(tx, &task.id))?;
    info!("[Rewards] Completed '{}' for {} tokens", task.id, task.reward);
    Ok(task)
}

pub fn is_completed(conn: &Connection, task: &TaskEntry) -> Result<bool, Error> {
    Ok(CompletedTask::exists(conn, &task.id)?)
}

/// Share of the tasks with `cadence` already completed, as a rounded
/// percentage.
pub fn progress(conn: &Connection, pack: &ContentPack, cadence: Cadence) -> Result<u32, Error> {
    let mut total = 0;
    let mut done = 0;
    for task in pack.tasks_with(cadence) {
        total += 1;
        if is_completed(conn, task)? {
            done += 1;
        }
    }
    if total == 0 {
        return Ok(0);
    }
    Ok((done as f64 / total as f64 * 100.0).round() as u32)
}

pub fn is_readable(conn: &Connection, article: &ArticleEntry) -> Result<bool, Error> {
    if !article.is_premium || article.token_cost == 0 {
        return Ok(true);
    }
    Ok(UnlockedArticle::exists(conn, &article.id)?)
}

/// Pays for a premium article. Already readable articles cost nothing.
pub fn unlock_article(
    conn: &Connection,
    wallet: &mut Wallet,
    article: &ArticleEntry,
) -> Result<(), Error> {
    if is_readable(conn, article)? {
        return Ok(());
    }
    wallet.charge(conn, article.token_cost, |tx| {
        UnlockedArticle::add(tx, &article.id)
    })?;
    info!(
        "[Rewards] Unlocked article '{}' for {} tokens",
        article.id, article.token_cost
    );
    Ok(())
}
