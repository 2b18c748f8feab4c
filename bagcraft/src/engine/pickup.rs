//! The finite set of craftable ingredients.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// One unit of a craftable ingredient.
///
/// Identity-comparable and orderable so a bag of pickups can be sorted
/// into canonical form before crafting or memoization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Pickup {
    RedHeart,
    SoulHeart,
    BlackHeart,
    EternalHeart,
    GoldHeart,
    BoneHeart,
    RottenHeart,
    Penny,
    Nickel,
    Dime,
    LuckyPenny,
    Key,
    GoldenKey,
    ChargedKey,
    Bomb,
    GoldenBomb,
    GigaBomb,
    MicroBattery,
    LilBattery,
    MegaBattery,
    Card,
    Pill,
    Rune,
    DiceShard,
    CrackedKey,
}

impl Pickup {
    /// All pickup kinds, in canonical order.
    pub const ALL: [Pickup; 25] = [
        Pickup::RedHeart,
        Pickup::SoulHeart,
        Pickup::BlackHeart,
        Pickup::EternalHeart,
        Pickup::GoldHeart,
        Pickup::BoneHeart,
        Pickup::RottenHeart,
        Pickup::Penny,
        Pickup::Nickel,
        Pickup::Dime,
        Pickup::LuckyPenny,
        Pickup::Key,
        Pickup::GoldenKey,
        Pickup::ChargedKey,
        Pickup::Bomb,
        Pickup::GoldenBomb,
        Pickup::GigaBomb,
        Pickup::MicroBattery,
        Pickup::LilBattery,
        Pickup::MegaBattery,
        Pickup::Card,
        Pickup::Pill,
        Pickup::Rune,
        Pickup::DiceShard,
        Pickup::CrackedKey,
    ];

    /// Crafting weight of this pickup.
    pub fn weight(self) -> u32 {
        match self {
            Pickup::RedHeart => 1,
            Pickup::SoulHeart => 4,
            Pickup::BlackHeart => 5,
            Pickup::EternalHeart => 5,
            Pickup::GoldHeart => 5,
            Pickup::BoneHeart => 5,
            Pickup::RottenHeart => 1,
            Pickup::Penny => 1,
            Pickup::Nickel => 3,
            Pickup::Dime => 5,
            Pickup::LuckyPenny => 8,
            Pickup::Key => 2,
            Pickup::GoldenKey => 5,
            Pickup::ChargedKey => 5,
            Pickup::Bomb => 2,
            Pickup::GoldenBomb => 6,
            Pickup::GigaBomb => 10,
            Pickup::MicroBattery => 2,
            Pickup::LilBattery => 4,
            Pickup::MegaBattery => 8,
            Pickup::Card => 2,
            Pickup::Pill => 2,
            Pickup::Rune => 4,
            Pickup::DiceShard => 4,
            Pickup::CrackedKey => 2,
        }
    }

    /// Xorshift parameters mixed into the craft RNG for this pickup.
    pub(crate) fn shifts(self) -> (u32, u32, u32) {
        match self {
            Pickup::RedHeart => (0x01, 0x05, 0x13),
            Pickup::SoulHeart => (0x01, 0x09, 0x1D),
            Pickup::BlackHeart => (0x01, 0x0B, 0x06),
            Pickup::EternalHeart => (0x01, 0x0B, 0x10),
            Pickup::GoldHeart => (0x01, 0x13, 0x03),
            Pickup::BoneHeart => (0x01, 0x15, 0x14),
            Pickup::RottenHeart => (0x01, 0x1B, 0x1B),
            Pickup::Penny => (0x02, 0x05, 0x0F),
            Pickup::Nickel => (0x02, 0x05, 0x15),
            Pickup::Dime => (0x02, 0x07, 0x07),
            Pickup::LuckyPenny => (0x02, 0x07, 0x09),
            Pickup::Key => (0x02, 0x07, 0x19),
            Pickup::GoldenKey => (0x02, 0x09, 0x0F),
            Pickup::ChargedKey => (0x02, 0x0F, 0x11),
            Pickup::Bomb => (0x02, 0x0F, 0x19),
            Pickup::GoldenBomb => (0x02, 0x15, 0x09),
            Pickup::GigaBomb => (0x03, 0x01, 0x0E),
            Pickup::MicroBattery => (0x03, 0x03, 0x1A),
            Pickup::LilBattery => (0x03, 0x03, 0x1C),
            Pickup::MegaBattery => (0x03, 0x03, 0x1D),
            Pickup::Card => (0x03, 0x05, 0x14),
            Pickup::Pill => (0x03, 0x05, 0x16),
            Pickup::Rune => (0x03, 0x05, 0x19),
            Pickup::DiceShard => (0x03, 0x07, 0x1D),
            Pickup::CrackedKey => (0x03, 0x0D, 0x07),
        }
    }

    /// Snake-case name as used on the wire and the command line.
    pub fn name(self) -> &'static str {
        match self {
            Pickup::RedHeart => "red_heart",
            Pickup::SoulHeart => "soul_heart",
            Pickup::BlackHeart => "black_heart",
            Pickup::EternalHeart => "eternal_heart",
            Pickup::GoldHeart => "gold_heart",
            Pickup::BoneHeart => "bone_heart",
            Pickup::RottenHeart => "rotten_heart",
            Pickup::Penny => "penny",
            Pickup::Nickel => "nickel",
            Pickup::Dime => "dime",
            Pickup::LuckyPenny => "lucky_penny",
            Pickup::Key => "key",
            Pickup::GoldenKey => "golden_key",
            Pickup::ChargedKey => "charged_key",
            Pickup::Bomb => "bomb",
            Pickup::GoldenBomb => "golden_bomb",
            Pickup::GigaBomb => "giga_bomb",
            Pickup::MicroBattery => "micro_battery",
            Pickup::LilBattery => "lil_battery",
            Pickup::MegaBattery => "mega_battery",
            Pickup::Card => "card",
            Pickup::Pill => "pill",
            Pickup::Rune => "rune",
            Pickup::DiceShard => "dice_shard",
            Pickup::CrackedKey => "cracked_key",
        }
    }
}

impl std::fmt::Display for Pickup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Pickup {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Pickup::ALL
            .iter()
            .copied()
            .find(|p| p.name() == s)
            .ok_or_else(|| format!("unknown pickup: {s}"))
    }
}
