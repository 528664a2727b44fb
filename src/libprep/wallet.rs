use crate::libprep::db;
use crate::libprep::error::Error;
use log::{debug, info};
use rusqlite::Connection;

pub const STARTING_BALANCE: u32 = 50;

/// The player's token balance. There is exactly one per process; sessions
/// borrow it mutably while they run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Wallet {
    balance: u32,
}

impl Default for Wallet {
    fn default() -> Self {
        Wallet::new(STARTING_BALANCE)
    }
}

impl Wallet {
    pub fn new(balance: u32) -> Wallet {
        Wallet { balance }
    }

    pub fn load(conn: &Connection) -> Result<Wallet, Error> {
        let wallet = match db::stored_balance(conn)? {
            Some(balance) => Wallet::new(balance),
            None => {
                info!("[Wallet] No stored balance, starting with {}", STARTING_BALANCE);
                Wallet::default()
            }
        };
        debug!("[Wallet] Loaded balance {}", wallet.balance);
        Ok(wallet)
    }

    pub fn save(&self, conn: &Connection) -> Result<(), Error> {
        db::store_balance(conn, self.balance)?;
        Ok(())
    }

    /// Spends `amount` tokens on whatever `record` writes. The row and the new
    /// balance are committed together; on any failure the balance stays put.
    pub fn charge<F>(&mut self, conn: &Connection, amount: u32, record: F) -> Result<u32, Error>
    where
        F: FnOnce(&Connection) -> rusqlite::Result<()>,
    {
        if !self.can_afford(amount) {
            return Err(Error::InsufficientTokens {
                needed: amount,
                balance: self.balance,
            });
        }
        self.commit(conn, self.balance - amount, record)
    }

    /// Pays out `amount` tokens for whatever `record` writes, committing both
    /// together.
    pub fn reward<F>(&mut self, conn: &Connection, amount: u32, record: F) -> Result<u32, Error>
    where
        F: FnOnce(&Connection) -> rusqlite::Result<()>,
    {
        self.commit(conn, self.balance.saturating_add(amount), record)
    }

    fn commit<F>(&mut self, conn: &Connection, balance: u32, record: F) -> Result<u32, Error>
    where
        F: FnOnce(&Connection) -> rusqlite::Result<()>,
    {
        let tx = conn.unchecked_transaction()?;
        record(&tx)?;
        db::store_balance(&tx, balance)?;
        tx.commit()?;
        debug!("[Wallet] {} -> {}", self.balance, balance);
        self.balance = balance;
        Ok(balance)
    }

    pub fn balance(&self) -> u32 {
        self.balance
    }

    pub fn can_afford(&self, amount: u32) -> bool {
        self.balance >= amount
    }

    pub fn credit(&mut self, amount: u32) -> u32 {
        self.balance = self.balance.saturating_add(amount);
        debug!("[Wallet] +{} -> {}", amount, self.balance);
        self.balance
    }

    /// Takes `amount` tokens, or refuses without touching the balance.
    pub fn debit(&mut self, amount: u32) -> Result<u32, Error> {
        if !self.can_afford(amount) {
            return Err(Error::InsufficientTokens {
                needed: amount,
                balance: self.balance,
            });
        }
        self.balance -= amount;
        debug!("[Wallet] -{} -> {}", amount, self.balance);
        Ok(self.balance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debit_refuses_overdraft() {
        let mut wallet = Wallet::new(1);
        assert!(matches!(
            wallet.debit(2),
            Err(Error::InsufficientTokens {
                needed: 2,
                balance: 1
            })
        ));
        assert_eq!(wallet.balance(), 1);
        assert_eq!(wallet.debit(1).unwrap(), 0);
    }

    #[test]
    fn credit_saturates() {
        let mut wallet = Wallet::new(u32::MAX - 1);
        assert_eq!(wallet.credit(5), u32::MAX);
    }

    #[test]
    fn charge_commits_row_and_balance_together() {
        let conn = db::open_in_memory().unwrap();
        let mut wallet = Wallet::new(10);
        let left = wallet
            .charge(&conn, 4, |tx| db::UnlockedArticle::add(tx, "4"))
            .unwrap();
        assert_eq!(left, 6);
        assert_eq!(db::stored_balance(&conn).unwrap(), Some(6));
        assert!(db::UnlockedArticle::exists(&conn, "4").unwrap());
    }

    #[test]
    fn failed_record_leaves_balance_untouched() {
        let conn = db::open_in_memory().unwrap();
        db::store_balance(&conn, 10).unwrap();
        let mut wallet = Wallet::load(&conn).unwrap();

        let result = wallet.charge(&conn, 5, |tx| {
            tx.execute("INSERT INTO NoSuchTable VALUES (1)", ()).map(|_| ())
        });
        assert!(matches!(result, Err(Error::Db(_))));
        let result = wallet.reward(&conn, 5, |tx| {
            tx.execute("INSERT INTO NoSuchTable VALUES (1)", ()).map(|_| ())
        });
        assert!(matches!(result, Err(Error::Db(_))));

        assert_eq!(wallet.balance(), 10);
        assert_eq!(db::stored_balance(&conn).unwrap(), Some(10));
    }

    #[test]
    fn charge_refuses_overdraft_before_writing() {
        let conn = db::open_in_memory().unwrap();
        let mut wallet = Wallet::new(3);
        let result = wallet.charge(&conn, 5, |tx| db::UnlockedArticle::add(tx, "2"));
        assert!(matches!(
            result,
            Err(Error::InsufficientTokens {
                needed: 5,
                balance: 3
            })
        ));
        assert!(!db::UnlockedArticle::exists(&conn, "2").unwrap());
        assert_eq!(db::stored_balance(&conn).unwrap(), None);
    }

    #[test]
    fn fresh_store_starts_with_default_balance() {
        let conn = db::open_in_memory().unwrap();
        let mut wallet = Wallet::load(&conn).unwrap();
        assert_eq!(wallet.balance(), STARTING_BALANCE);

        wallet.credit(7);
        wallet.save(&conn).unwrap();
        assert_eq!(Wallet::load(&conn).unwrap().balance(), STARTING_BALANCE + 7);
    }
}
