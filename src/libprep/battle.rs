use crate::libprep::db::BattlePass;
use crate::libprep::error::Error;
use crate::libprep::results::Results;
use crate::libprep::validate;
use crate::libprep::wallet::Wallet;
use log::{debug, info};
use rand::seq::IndexedRandom;
use rand::Rng;
use rusqlite::Connection;
use std::str::FromStr;

const ROOM_ID_LEN: usize = 6;
const ROOM_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
pub const PLAYER_NAME: &str = "You";

const BASE_PAYOUT: u32 = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    pub name: String,
    pub score: u32,
    pub ready: bool,
    pub host: bool,
}

impl Participant {
    fn new(name: &str, score: u32, host: bool) -> Participant {
        Participant {
            name: name.to_string(),
            score,
            ready: true,
            host,
        }
    }

    pub fn is_player(&self) -> bool {
        self.name == PLAYER_NAME
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Standing {
    pub rank: usize,
    pub name: String,
    pub score: u32,
}

/// A battle room. Everyone except the player is simulated locally.
#[derive(Debug, Clone)]
pub struct Room {
    pub id: String,
    pub participants: Vec<Participant>,
}

pub fn generate_room_id<R: Rng>(rng: &mut R) -> String {
    (0..ROOM_ID_LEN)
        .filter_map(|_| ROOM_ALPHABET.choose(rng).map(|b| *b as char))
        .collect()
}

impl Room {
    pub fn create<R: Rng>(rng: &mut R) -> Room {
        let id = generate_room_id(rng);
        info!("[Battle] Created room {}", id);
        Self::with_opponents(id, rng)
    }

    /// Joins the room behind an invite code. Blank codes are refused.
    pub fn join<R: Rng>(invite: &str, rng: &mut R) -> Result<Room, Error> {
        let id = validate::invite_code(invite)?;
        info!("[Battle] Joining room {}", id);
        Ok(Self::with_opponents(id.to_uppercase(), rng))
    }

    fn with_opponents<R: Rng>(id: String, rng: &mut R) -> Room {
        Room {
            id,
            participants: vec![
                Participant::new(PLAYER_NAME, 0, false),
                Participant::new("Rahul", rng.random_range(0..3), true),
                Participant::new("Anjali", rng.random_range(0..3), false),
            ],
        }
    }

    pub fn player(&self) -> Option<&Participant> {
        self.participants.iter().find(|p| p.is_player())
    }

    pub fn set_player_score(&mut self, score: u32) {
        if let Some(player) = self.participants.iter_mut().find(|p| p.is_player()) {
            player.score = score;
        }
    }

    /// One simulated opponent answer: a random opponent gets it right half of
    /// the time. Returns the name of the opponent who scored.
    pub fn simulate_opponent<R: Rng>(&mut self, rng: &mut R) -> Option<String> {
        let opponents: Vec<usize> = self
            .participants
            .iter()
            .enumerate()
            .filter(|(_, p)| !p.is_player())
            .map(|(i, _)| i)
            .collect();
        let index = *opponents.choose(rng)?;
        if !rng.random_bool(0.5) {
            debug!("[Battle] {} missed", self.participants[index].name);
            return None;
        }
        let opponent = &mut self.participants[index];
        opponent.score += 1;
        debug!("[Battle] {} scored, now {}", opponent.name, opponent.score);
        Some(opponent.name.clone())
    }

    /// Participants ordered by score, highest first. Ties keep seating order.
    pub fn standings(&self) -> Vec<Standing> {
        let mut sorted: Vec<&Participant> = self.participants.iter().collect();
        sorted.sort_by(|a, b| b.score.cmp(&a.score));
        sorted
            .into_iter()
            .enumerate()
            .map(|(i, p)| Standing {
                rank: i + 1,
                name: p.name.clone(),
                score: p.score,
            })
            .collect()
    }

    pub fn player_rank(&self) -> usize {
        self.standings()
            .iter()
            .find(|s| s.name == PLAYER_NAME)
            .map(|s| s.rank)
            .unwrap_or(self.participants.len())
    }
}

/// Tokens paid out at the end of a battle.
pub fn payout(rank: usize, results: &Results) -> u32 {
    let rank_bonus = match rank {
        1 => 10,
        2 => 5,
        _ => 0,
    };
    let accuracy_bonus = if results.total == 0 {
        0
    } else {
        results.score * 10 / results.total
    };
    BASE_PAYOUT + rank_bonus + accuracy_bonus
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassPlan {
    Basic,
    Standard,
    Premium,
}

impl PassPlan {
    pub const ALL: [PassPlan; 3] = [PassPlan::Basic, PassPlan::Standard, PassPlan::Premium];

    pub fn id(self) -> &'static str {
        match self {
            PassPlan::Basic => "basic",
            PassPlan::Standard => "standard",
            PassPlan::Premium => "premium",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            PassPlan::Basic => "Basic Battle Pass",
            PassPlan::Standard => "Standard Battle Pass",
            PassPlan::Premium => "Premium Battle Pass",
        }
    }

    /// Price in tokens for a single pass.
    pub fn price(self) -> u32 {
        match self {
            PassPlan::Basic => 10,
            PassPlan::Standard => 25,
            PassPlan::Premium => 50,
        }
    }

    pub fn features(self) -> &'static [&'static str] {
        match self {
            PassPlan::Basic => &["5 Battle Entries", "Standard Matchmaking", "Basic Rewards"],
            PassPlan::Standard => &[
                "15 Battle Entries",
                "Priority Matchmaking",
                "Standard Rewards",
                "1 Free Skip",
            ],
            PassPlan::Premium => &[
                "Unlimited Battles for 7 days",
                "Instant Matchmaking",
                "Premium Rewards",
                "3 Free Skips",
                "Exclusive Badges",
            ],
        }
    }
}

impl FromStr for PassPlan {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        PassPlan::ALL
            .into_iter()
            .find(|plan| plan.id() == wanted)
            .ok_or_else(|| Error::UnknownPlan(s.trim().to_string()))
    }
}

/// Buys `quantity` passes of `plan` with tokens. Returns the total paid.
pub fn purchase_pass(
    conn: &Connection,
    wallet: &mut Wallet,
    plan: PassPlan,
    quantity: u32,
) -> Result<u32, Error> {
    if quantity == 0 {
        return Err(Error::InvalidQuantity);
    }
    let total = plan.price().checked_mul(quantity).ok_or(Error::InsufficientTokens {
        needed: u32::MAX,
        balance: wallet.balance(),
    })?;
    wallet.charge(conn, total, |tx| BattlePass::add(tx, plan.id(), quantity))?;
    info!("[Battle] Bought {} x {} for {} tokens", quantity, plan.name(), total);
    Ok(total)
}
