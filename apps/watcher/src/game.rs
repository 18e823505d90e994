//! Rock-paper-scissors against the bot

use rand::Rng;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hand {
    Rock,
    Paper,
    Scissors,
}

impl Hand {
    pub const ALL: [Hand; 3] = [Hand::Rock, Hand::Paper, Hand::Scissors];

    pub fn random() -> Self {
        Self::ALL[rand::rng().random_range(0..Self::ALL.len())]
    }

    pub fn beats(self, other: Hand) -> bool {
        matches!(
            (self, other),
            (Hand::Rock, Hand::Scissors) | (Hand::Paper, Hand::Rock) | (Hand::Scissors, Hand::Paper)
        )
    }

    pub fn emoji(self) -> &'static str {
        match self {
            Hand::Rock => "🪨",
            Hand::Paper => "📄",
            Hand::Scissors => "✂️",
        }
    }
}

impl fmt::Display for Hand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Hand::Rock => "rock",
            Hand::Paper => "paper",
            Hand::Scissors => "scissors",
        };
        write!(f, "{} {}", self.emoji(), name)
    }
}

#[derive(Debug, thiserror::Error)]
#[error("`{0}` is not rock, paper or scissors")]
pub struct UnknownHand(pub String);

impl FromStr for Hand {
    type Err = UnknownHand;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "rock" | "r" | "🪨" => Ok(Hand::Rock),
            "paper" | "p" | "📄" => Ok(Hand::Paper),
            "scissors" | "scissor" | "s" | "✂️" | "✂" => Ok(Hand::Scissors),
            _ => Err(UnknownHand(s.trim().to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Win,
    Lose,
    Draw,
}

/// Verdict from the player's point of view
pub fn play(player: Hand, bot: Hand) -> Verdict {
    if player == bot {
        Verdict::Draw
    } else if player.beats(bot) {
        Verdict::Win
    } else {
        Verdict::Lose
    }
}

pub fn describe(player: Hand, bot: Hand) -> String {
    let outcome = match play(player, bot) {
        Verdict::Win => "You win! 🎉",
        Verdict::Lose => "I win! 🦢",
        Verdict::Draw => "Draw. 🤝",
    };
    format!("You: {player}\nMe: {bot}\n{outcome}")
}
