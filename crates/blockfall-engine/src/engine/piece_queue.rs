use std::{collections::VecDeque, fmt::Write as _};

use rand::{
    Rng, SeedableRng as _,
    distr::{Distribution, StandardUniform},
    seq::SliceRandom,
};
use rand_pcg::Pcg32;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::PieceKind;

/// Number of upcoming pieces visible at all times.
pub const QUEUE_LEN: usize = 5;

/// Strategy used to draw the next piece kind.
#[derive(
    Debug,
    Default,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Deserialize,
    Serialize,
    derive_more::Display,
    derive_more::FromStr,
)]
#[serde(rename_all = "lowercase")]
pub enum Randomizer {
    /// Every kind independently with probability 1/7.
    #[default]
    #[display("uniform")]
    Uniform,
    /// Shuffled bags of all seven kinds, dealt one bag at a time.
    #[display("bag")]
    Bag,
}

/// Seed for deterministic piece generation.
///
/// A 128-bit seed for the piece generator. The same seed (and [`Randomizer`]) always
/// produces the same piece sequence, which is what makes game simulations replayable.
///
/// # Example
///
/// ```
/// use blockfall_engine::{PieceQueue, PieceSeed, Randomizer};
/// use rand::Rng as _;
///
/// let seed: PieceSeed = rand::rng().random();
/// let mut a = PieceQueue::with_seed(seed, Randomizer::Bag);
/// let mut b = PieceQueue::with_seed(seed, Randomizer::Bag);
/// assert_eq!(a.pop_next(), b.pop_next());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PieceSeed([u8; 16]);

impl PieceSeed {
    /// Expands a 64-bit number into a seed. Handy for command-line seeds.
    #[must_use]
    pub fn from_u64(value: u64) -> Self {
        Self(u128::from(value).to_be_bytes())
    }
}

impl Serialize for PieceSeed {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let num = u128::from_be_bytes(self.0);
        let mut hex_str = String::with_capacity(2 * self.0.len());
        write!(&mut hex_str, "{num:032x}").map_err(serde::ser::Error::custom)?;
        serializer.serialize_str(&hex_str)
    }
}

impl<'de> Deserialize<'de> for PieceSeed {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let hex_str = String::deserialize(deserializer)?;
        if hex_str.len() != 32 {
            return Err(serde::de::Error::custom(format!(
                "invalid hex: expected 32 characters, got {}",
                hex_str.len()
            )));
        }
        let num = u128::from_str_radix(&hex_str, 16)
            .map_err(|e| serde::de::Error::custom(format!("invalid hex: {hex_str} ({e})")))?;
        Ok(Self(num.to_be_bytes()))
    }
}

impl Distribution<PieceSeed> for StandardUniform {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> PieceSeed {
        let mut seed = [0; 16];
        rng.fill(&mut seed);
        PieceSeed(seed)
    }
}

/// Lookahead queue of upcoming pieces together with the generator that feeds it.
///
/// The queue always holds exactly [`QUEUE_LEN`] kinds: every [`pop_next`](Self::pop_next)
/// draws one replacement. The generator is part of the value, so a cloned queue
/// produces the same future pieces as the original.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PieceQueue {
    rng: Pcg32,
    randomizer: Randomizer,
    bag: Vec<PieceKind>,
    upcoming: VecDeque<PieceKind>,
}

impl PieceQueue {
    /// Creates a queue seeded from `seed` and fills the lookahead.
    #[must_use]
    pub fn with_seed(seed: PieceSeed, randomizer: Randomizer) -> Self {
        let mut this = Self {
            rng: Pcg32::from_seed(seed.0),
            randomizer,
            bag: Vec::with_capacity(PieceKind::LEN),
            upcoming: VecDeque::with_capacity(QUEUE_LEN + 1),
        };
        while this.upcoming.len() < QUEUE_LEN {
            let kind = this.draw();
            this.upcoming.push_back(kind);
        }
        this
    }

    #[must_use]
    pub fn randomizer(&self) -> Randomizer {
        self.randomizer
    }

    fn draw(&mut self) -> PieceKind {
        match self.randomizer {
            Randomizer::Uniform => self.rng.random(),
            Randomizer::Bag => {
                if self.bag.is_empty() {
                    self.bag.extend(PieceKind::ALL);
                    self.bag.shuffle(&mut self.rng);
                }
                self.bag.pop().expect("bag is refilled before drawing")
            }
        }
    }

    /// Takes the head of the queue and appends a freshly drawn piece.
    ///
    /// # Panics
    ///
    /// Panics if the queue is empty (never happens: the length is constant).
    pub fn pop_next(&mut self) -> PieceKind {
        let kind = self.draw();
        self.upcoming.push_back(kind);
        self.upcoming
            .pop_front()
            .expect("piece queue should never be empty")
    }

    /// Returns the piece that the next [`pop_next`](Self::pop_next) will yield.
    ///
    /// # Panics
    ///
    /// Panics if the queue is empty (never happens: the length is constant).
    #[must_use]
    pub fn peek(&self) -> PieceKind {
        self.upcoming[0]
    }

    /// Returns the upcoming pieces, next first.
    pub fn upcoming(&self) -> impl Iterator<Item = PieceKind> + '_ {
        self.upcoming.iter().copied()
    }
}
