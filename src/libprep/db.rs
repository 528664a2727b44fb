use log::{debug, error, info, warn};
use rusqlite::{params, Connection, DatabaseName, OptionalExtension, Result};
use std::path::Path;
use std::time::Instant;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedTask {
    pub task_id: String,
}
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnlockedArticle {
    pub article_id: String,
}
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invite {
    pub email: String,
}
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BattlePass {
    pub plan: String,
    pub quantity: u32,
}

pub fn stored_balance(connection: &Connection) -> Result<Option<u32>> {
    connection
        .query_row("SELECT balance FROM Wallet WHERE id = 1", [], |row| row.get(0))
        .optional()
}

pub fn store_balance(connection: &Connection, balance: u32) -> Result<()> {
    match connection.execute(
        "INSERT INTO Wallet(id, balance) VALUES (1, ?1) \
         ON CONFLICT(id) DO UPDATE SET balance = excluded.balance",
        params![balance],
    ) {
        Ok(_) => {
            debug!("[DB] Stored balance {}", balance);
            Ok(())
        }
        Err(err) => {
            error!("[DB] Failed to store balance {}: {:?}", balance, err);
            Err(err)
        }
    }
}

impl CompletedTask {
    pub fn add(connection: &Connection, task_id: &str) -> Result<()> {
        match connection.execute(
            "INSERT INTO CompletedTask(taskId) VALUES (?1)",
            params![task_id],
        ) {
            Ok(_) => {
                debug!("[DB] Marked task '{}' as completed", task_id);
                Ok(())
            }
            Err(err) => {
                error!("[DB] Error while completing task '{}': {:?}", task_id, err);
                Err(err)
            }
        }
    }

    pub fn exists(connection: &Connection, task_id: &str) -> Result<bool> {
        let mut statement =
            connection.prepare("SELECT 1 FROM CompletedTask WHERE taskId = :taskId LIMIT 1")?;
        statement.exists(&[(":taskId", &task_id)])
    }

    pub fn get_all(connection: &Connection) -> Result<Vec<CompletedTask>> {
        let mut statement = connection.prepare("SELECT taskId FROM CompletedTask")?;
        let rows = statement.query_map([], |row| {
            Ok(CompletedTask {
                task_id: row.get(0)?,
            })
        })?;

        rows.collect()
    }
}

impl UnlockedArticle {
    pub fn add(connection: &Connection, article_id: &str) -> Result<()> {
        match connection.execute(
            "INSERT OR IGNORE INTO UnlockedArticle(articleId) VALUES (?1)",
            params![article_id],
        ) {
            Ok(_) => {
                debug!("[DB] Unlocked article '{}'", article_id);
                Ok(())
            }
            Err(err) => {
                error!("[DB] Error while unlocking article '{}': {:?}", article_id, err);
                Err(err)
            }
        }
    }

    pub fn exists(connection: &Connection, article_id: &str) -> Result<bool> {
        let mut statement = connection
            .prepare("SELECT 1 FROM UnlockedArticle WHERE articleId = :articleId LIMIT 1")?;
        statement.exists(&[(":articleId", &article_id)])
    }
}

impl Invite {
    pub fn add(connection: &Connection, email: &str) -> Result<()> {
        match connection.execute("INSERT INTO Invite(email) VALUES (?1)", params![email]) {
            Ok(_) => {
                debug!("[DB] Recorded invite for '{}'", email);
                Ok(())
            }
            Err(err) => {
                error!("[DB] Error while recording invite: {:?}", err);
                Err(err)
            }
        }
    }

    pub fn exists(connection: &Connection, email: &str) -> Result<bool> {
        let mut statement =
            connection.prepare("SELECT 1 FROM Invite WHERE email = :email LIMIT 1")?;
        statement.exists(&[(":email", &email)])
    }

    pub fn get_all(connection: &Connection) -> Result<Vec<Invite>> {
        let mut statement = connection.prepare("SELECT email FROM Invite")?;
        let rows = statement.query_map([], |row| Ok(Invite { email: row.get(0)? }))?;

        rows.collect()
    }
}

impl BattlePass {
    pub fn add(connection: &Connection, plan: &str, quantity: u32) -> Result<()> {
        match connection.execute(
            "INSERT INTO BattlePass(plan, quantity) VALUES (?1, ?2)",
            params![plan, quantity],
        ) {
            Ok(_) => {
                debug!("[DB] Recorded {} x '{}' battle pass", quantity, plan);
                Ok(())
            }
            Err(err) => {
                error!("[DB] Error while recording battle pass: {:?}", err);
                Err(err)
            }
        }
    }

    pub fn get_all(connection: &Connection) -> Result<Vec<BattlePass>> {
        let mut statement = connection.prepare("SELECT plan, quantity FROM BattlePass")?;
        let rows = statement.query_map([], |row| {
            Ok(BattlePass {
                plan: row.get(0)?,
                quantity: row.get(1)?,
            })
        })?;

        rows.collect()
    }
}

pub fn create_or_open(src: &Path) -> Result<Connection> {
    if src.exists() {
        info!("[DB] Opening existing Database");
        open_db(src)
    } else {
        info!("[DB] Creating new Database");
        create_db(src)
    }
}

pub fn create_db(dest: &Path) -> Result<Connection> {
    let now = Instant::now();
    let db = open_in_memory()?;
    match db.backup(DatabaseName::Main, dest, None) {
        Ok(_) => {
            debug!(
                "[DB] Creating and Saving took {} ms.",
                now.elapsed().as_millis()
            );
            close_db(db)?;
            open_db(dest)
        }
        Err(err) => {
            warn!("[DB] Failed to create database file: {}", err);
            close_db(db)?;
            Err(err)
        }
    }
}

pub fn open_db(src: &Path) -> Result<Connection> {
    let now = Instant::now();
    let db = Connection::open(src)?;
    debug!("[DB] Opening took {} ms.", now.elapsed().as_millis());
    Ok(db)
}

/// A fresh database that lives only as long as the connection.
pub fn open_in_memory() -> Result<Connection> {
    init_db(Connection::open_in_memory()?)
}

pub fn close_db(connection: Connection) -> Result<()> {
    info!("[DB] Closing Database");
    let mut connection = connection;
    for attempt in 1..=2 {
        match connection.close() {
            Ok(_) => return Ok(()),
            Err((conn, _)) => {
                error!("[DB] Cannot close connection. Retrying {}/2...", attempt);
                connection = conn;
            }
        }
    }
    connection.close().map_err(|(_, err)| {
        error!("[DB] Cannot close connection! Giving up.");
        err
    })
}

fn init_db(conn: Connection) -> Result<Connection> {
    info!("[DB INIT] Creating tables");
    conn.execute(
        "CREATE TABLE Wallet (
              id INTEGER NOT NULL PRIMARY KEY CHECK (id = 1),
              balance INTEGER NOT NULL
            )",
        (),
    )?;
    info!("[DB INIT] Created table Wallet");
    conn.execute(
        "CREATE TABLE CompletedTask (
              taskId TEXT NOT NULL PRIMARY KEY
            )",
        (),
    )?;
    info!("[DB INIT] Created table CompletedTask");
    conn.execute(
        "CREATE TABLE UnlockedArticle (
              articleId TEXT NOT NULL PRIMARY KEY
            )",
        (),
    )?;
    info!("[DB INIT] Created table UnlockedArticle");
    conn.execute(
        "CREATE TABLE Invite (
              email TEXT NOT NULL PRIMARY KEY
            )",
        (),
    )?;
    info!("[DB INIT] Created table Invite");
    conn.execute(
        "CREATE TABLE BattlePass (
              id INTEGER NOT NULL PRIMARY KEY AUTOINCREMENT,
              plan TEXT NOT NULL,
              quantity INTEGER NOT NULL CHECK (quantity > 0)
            )",
        (),
    )?;
    info!("[DB INIT] Created table BattlePass");
    info!("[DB INIT] Database Creation Successful!");

    Ok(conn)
}
