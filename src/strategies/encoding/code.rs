use rand::{Rng, SeedableRng};
use rand_chacha::ChaChaRng;
use std::fmt;

use crate::game::*;

/// Rank groups a clue can name; each group counts as one residue.
pub type Groups = Vec<Vec<Value>>;

/// Clue tokens per target: the five ranks, then the five colors.
pub const TOKENS: usize = 10;

// candidate codes drawn per clue, split evenly across base combinations
const CANDIDATES: usize = 100;

// weight of each rank when judging how much a code narrows a card down
const RANK_WEIGHTS: [f64; 5] = [3.0, 2.0, 2.0, 2.0, 1.0];

// Residue bases a clue can carry at once. Each product fits in the
// 10 tokens times the number of targets.
const TWO_PLAYERS: &[&[usize]] = &[&[2, 5], &[3, 3]];
const THREE_PLAYERS: &[&[usize]] = &[&[2, 2, 5], &[4, 5], &[2, 3, 3]];
const FOUR_PLAYERS: &[&[usize]] = &[&[2, 3, 5], &[3, 3, 3], &[5, 5], &[2, 2, 2, 3]];
const FIVE_PLAYERS: &[&[usize]] = &[
    &[2, 2, 2, 5],
    &[2, 4, 5],
    &[2, 2, 3, 3],
    &[3, 3, 4],
    &[2, 2, 2, 2, 2],
    &[5, 5],
];

pub fn base_combinations(num_players: usize) -> &'static [&'static [usize]] {
    match num_players {
        2 => TWO_PLAYERS,
        3 => THREE_PLAYERS,
        4 => FOUR_PLAYERS,
        5 => FIVE_PLAYERS,
        _ => &[],
    }
}

pub fn token(index: usize) -> Hinted {
    if index < VALUES.len() {
        Hinted::Value(VALUES[index])
    } else {
        Hinted::Color(VANILLA_COLORS[index - VALUES.len()])
    }
}

pub fn token_index(hinted: &Hinted) -> Option<usize> {
    match *hinted {
        Hinted::Value(value) => VALUES.iter().position(|&v| v == value),
        Hinted::Color(color) => VANILLA_COLORS
            .iter()
            .position(|&c| c == color)
            .map(|index| index + VALUES.len()),
    }
}

/// Ranks and colors a card may still have, as every player at the table
/// works them out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Possibilities {
    pub ranks: Vec<Value>,
    pub colors: Vec<Color>,
}
impl Possibilities {
    pub fn unknown() -> Possibilities {
        Possibilities {
            ranks: VALUES.to_vec(),
            colors: VANILLA_COLORS.to_vec(),
        }
    }

    // stands in for a slot that holds no card
    pub fn placeholder() -> Possibilities {
        Possibilities {
            ranks: vec![1],
            colors: vec!['r'],
        }
    }

    pub fn cards(&self) -> impl Iterator<Item = Card> + '_ {
        self.colors
            .iter()
            .flat_map(move |&color| self.ranks.iter().map(move |&value| Card::new(color, value)))
    }

    pub fn contains(&self, card: &Card) -> bool {
        self.ranks.contains(&card.value) && self.colors.contains(&card.color)
    }

    pub fn is_empty(&self) -> bool {
        self.ranks.is_empty() || self.colors.is_empty()
    }

    pub fn is_determined(&self) -> bool {
        self.ranks.len() == 1 && self.colors.len() == 1
    }

    /// Keeps the ranks and colors of the cards `keep` accepts; true if
    /// anything was dropped.
    pub fn retain_cards(&mut self, keep: impl Fn(&Card) -> bool) -> bool {
        let kept = self.cards().filter(|card| keep(card)).collect::<Vec<_>>();
        let ranks = self
            .ranks
            .iter()
            .copied()
            .filter(|&value| kept.iter().any(|card| card.value == value))
            .collect::<Vec<_>>();
        let colors = self
            .colors
            .iter()
            .copied()
            .filter(|&color| kept.iter().any(|card| card.color == color))
            .collect::<Vec<_>>();
        let changed = ranks.len() < self.ranks.len() || colors.len() < self.colors.len();
        self.ranks = ranks;
        self.colors = colors;
        changed
    }
}
impl fmt::Display for Possibilities {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("{")?;
        for value in &self.ranks {
            write!(f, "{}", value)?;
        }
        f.write_str("}{")?;
        for color in &self.colors {
            write!(f, "{}", color)?;
        }
        f.write_str("}")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Axis {
    Ranks(Groups),
    Colors,
}
impl Axis {
    pub fn base(&self) -> usize {
        match self {
            Axis::Ranks(groups) => groups.len(),
            Axis::Colors => VANILLA_COLORS.len(),
        }
    }

    pub fn group_of(&self, card: &Card) -> Option<usize> {
        match self {
            Axis::Ranks(groups) => groups.iter().position(|group| group.contains(&card.value)),
            Axis::Colors => VANILLA_COLORS.iter().position(|&color| color == card.color),
        }
    }

    pub fn restrict(&self, group: usize, possible: &mut Possibilities) {
        match self {
            Axis::Ranks(groups) => {
                let allowed = groups.get(group).cloned().unwrap_or_default();
                possible.ranks.retain(|value| allowed.contains(value));
            }
            Axis::Colors => {
                let allowed = VANILLA_COLORS.get(group).copied();
                possible.colors.retain(|&color| Some(color) == allowed);
            }
        }
    }
}

/// One residue of a clue: the sum of the groups of one card per target,
/// taken modulo the number of groups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Component {
    pub axis: Axis,
    // a slot per player other than the clue giver, in seat order;
    // None points at the placeholder
    pub columns: Vec<Option<usize>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Code {
    pub components: Vec<Component>,
}
impl Code {
    pub fn capacity(&self) -> usize {
        self.components
            .iter()
            .map(|component| component.axis.base())
            .product()
    }

    /// Position of `residues` among all residue tuples, last component fastest.
    pub fn index_of(&self, residues: &[usize]) -> usize {
        self.components
            .iter()
            .zip(residues)
            .fold(0, |index, (component, &residue)| {
                index * component.axis.base() + residue
            })
    }

    pub fn residues_at(&self, mut index: usize) -> Option<Vec<usize>> {
        if index >= self.capacity() {
            return None;
        }
        let mut residues = vec![0; self.components.len()];
        for (slot, component) in self.components.iter().enumerate().rev() {
            let base = component.axis.base();
            residues[slot] = index % base;
            index /= base;
        }
        Some(residues)
    }
}

/// A card whose group `restrict` applies to, read from a clue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Restriction {
    pub player: Player,
    pub column: usize,
    pub component: usize,
    pub group: usize,
}

pub fn others_of(hinter: Player, num_players: usize) -> Vec<Player> {
    (0..num_players as Player)
        .filter(|&player| player != hinter)
        .collect()
}

fn card_at(hands: &[Vec<Card>], player: Player, column: Option<usize>) -> Card {
    column
        .and_then(|column| hands[player as usize].get(column).copied())
        .unwrap_or_else(|| Card::new('r', 1))
}

fn slot_at<'a>(
    slots: &'a [Vec<Possibilities>],
    player: Player,
    column: Option<usize>,
    placeholder: &'a Possibilities,
) -> &'a Possibilities {
    column
        .and_then(|column| slots[player as usize].get(column))
        .unwrap_or(placeholder)
}

/// Splits ranks into playable, dead (below every playable rank) and the rest.
pub fn rank_classes(heights: &[Value]) -> (Vec<Value>, Vec<Value>, Vec<Value>) {
    let mut playable = heights
        .iter()
        .filter(|&&height| height < FINAL_VALUE)
        .map(|&height| height + 1)
        .collect::<Vec<_>>();
    playable.sort_unstable();
    playable.dedup();
    let lowest = playable.first().copied().unwrap_or(FINAL_VALUE + 1);
    let dead = VALUES
        .iter()
        .copied()
        .filter(|&value| value < lowest)
        .collect::<Vec<_>>();
    let rest = VALUES
        .iter()
        .copied()
        .filter(|value| !playable.contains(value) && !dead.contains(value))
        .collect();
    (playable, dead, rest)
}

/// Ways to split the ranks into groups, from finest to coarsest.
pub fn rank_groupings(heights: &[Value], hand_size: usize) -> Vec<Groups> {
    let (playable, dead, rest) = rank_classes(heights);
    let head = || {
        let mut groups: Groups = Vec::new();
        if !dead.is_empty() {
            groups.push(dead.clone());
        }
        groups.extend(playable.iter().map(|&value| vec![value]));
        groups
    };

    let mut candidates = Vec::new();
    let mut singles = head();
    singles.extend(rest.iter().map(|&value| vec![value]));
    candidates.push(singles);

    let mut lumped = head();
    if !rest.is_empty() {
        lumped.push(rest.clone());
    }
    candidates.push(lumped);

    if !dead.is_empty() || !rest.is_empty() {
        let mut unplayable = dead.iter().chain(rest.iter()).copied().collect::<Vec<_>>();
        unplayable.sort_unstable();
        candidates.push(vec![playable.clone(), unplayable]);
    }

    let skip = if dead.is_empty() { 0 } else { 1 };
    for size in (dead.len() + playable.len())..hand_size {
        let split = (size - skip - playable.len()).min(rest.len());
        let mut groups = head();
        groups.extend(rest[..split].iter().map(|&value| vec![value]));
        if split < rest.len() {
            groups.push(rest[split..].to_vec());
        }
        candidates.push(groups);
    }

    let mut unique: Vec<Groups> = Vec::new();
    for groups in candidates {
        if groups.len() > 1
            && groups.iter().all(|group| !group.is_empty())
            && !unique.contains(&groups)
        {
            unique.push(groups);
        }
    }
    unique
}

fn cartesian(choices: &[&Vec<Axis>]) -> Vec<Vec<Axis>> {
    let mut combinations: Vec<Vec<Axis>> = vec![Vec::new()];
    for options in choices {
        combinations = combinations
            .into_iter()
            .flat_map(|prefix| {
                options.iter().map(move |axis| {
                    let mut next = prefix.clone();
                    next.push(axis.clone());
                    next
                })
            })
            .collect();
    }
    combinations
}

/// How much `code` is expected to narrow down the cards it points at.
pub fn evaluate(
    code: &Code,
    others: &[Player],
    heights: &[Value],
    slots: &[Vec<Possibilities>],
) -> f64 {
    let (playable, dead, _) = rank_classes(heights);
    let mut weights = RANK_WEIGHTS;
    for value in playable {
        weights[value as usize - 1] *= 2.0;
    }
    for value in dead {
        weights[value as usize - 1] /= 2.0;
    }
    let placeholder = Possibilities::placeholder();

    let mut reduction = 0.0;
    for (seat, &player) in others.iter().enumerate() {
        let columns_of = |colors: bool| {
            let mut columns = code
                .components
                .iter()
                .filter(|component| (component.axis == Axis::Colors) == colors)
                .map(|component| component.columns[seat])
                .collect::<Vec<_>>();
            columns.sort_unstable();
            columns.dedup();
            columns
        };

        for column in columns_of(false) {
            let initial = &slot_at(slots, player, column, &placeholder).ranks;
            if initial.is_empty() {
                continue;
            }
            let mut weight_sum = 0.0;
            let mut weighted = 0.0;
            for &value in initial {
                let left = initial
                    .iter()
                    .filter(|&&other| {
                        code.components.iter().all(|component| match &component.axis {
                            Axis::Ranks(groups) if component.columns[seat] == column => groups
                                .iter()
                                .find(|group| group.contains(&value))
                                .map_or(true, |group| group.contains(&other)),
                            _ => true,
                        })
                    })
                    .count();
                let weight = weights[value as usize - 1];
                weight_sum += weight;
                weighted += weight * left as f64;
            }
            reduction += initial.len() as f64 - weighted / weight_sum;
        }

        for column in columns_of(true) {
            let colors = &slot_at(slots, player, column, &placeholder).colors;
            if !colors.is_empty() {
                reduction += colors.len() as f64 - 1.0;
            }
        }
    }
    reduction
}

/// The code `hinter` uses on `turn`. Every player draws the same candidates
/// from a generator seeded by the turn, so readers rebuild it exactly.
pub fn generate_code(
    turn: u32,
    hinter: Player,
    heights: &[Value],
    slots: &[Vec<Possibilities>],
    hand_size: usize,
) -> Option<Code> {
    if hand_size == 0 {
        return None;
    }
    let others = others_of(hinter, slots.len());

    let mut by_base: Vec<Vec<Axis>> = vec![Vec::new(); VANILLA_COLORS.len() + 1];
    by_base[VANILLA_COLORS.len()].push(Axis::Colors);
    for groups in rank_groupings(heights, hand_size) {
        let base = groups.len();
        if base < by_base.len() {
            by_base[base].push(Axis::Ranks(groups));
        }
    }

    let mut valid = Vec::new();
    for bases in base_combinations(slots.len()) {
        let choices = bases
            .iter()
            .map(|&base| &by_base[base])
            .filter(|options| !options.is_empty())
            .collect::<Vec<_>>();
        if !choices.is_empty() {
            valid.extend(cartesian(&choices));
        }
    }
    if valid.is_empty() {
        return None;
    }
    let per_combination = (CANDIDATES / valid.len()).max(1);

    let mut rng = ChaChaRng::seed_from_u64(turn as u64);
    let mut best: Option<(f64, Code)> = None;
    for axes in &valid {
        for _ in 0..per_combination {
            let components = axes
                .iter()
                .map(|axis| Component {
                    axis: axis.clone(),
                    columns: others
                        .iter()
                        .map(|&player| {
                            let column = rng.gen_range(0..hand_size);
                            if column < slots[player as usize].len() {
                                Some(column)
                            } else {
                                None
                            }
                        })
                        .collect(),
                })
                .collect();
            let code = Code { components };
            let reduction = evaluate(&code, &others, heights, slots);
            match best {
                Some((so_far, _)) if reduction <= so_far => {}
                _ => best = Some((reduction, code)),
            }
        }
    }
    best.map(|(_, code)| code)
}

/// The clue that carries the residues of the cards `hinter` sees.
pub fn encode(code: &Code, hinter: Player, hands: &[Vec<Card>]) -> Option<Hint> {
    let others = others_of(hinter, hands.len());
    let mut residues = Vec::with_capacity(code.components.len());
    for component in &code.components {
        let mut sum = 0;
        for (seat, &player) in others.iter().enumerate() {
            sum += component
                .axis
                .group_of(&card_at(hands, player, component.columns[seat]))?;
        }
        residues.push(sum % component.axis.base());
    }
    let index = code.index_of(&residues);
    Some(Hint {
        player: *others.get(index / TOKENS)?,
        hinted: token(index % TOKENS),
    })
}

/// Reads `hint` as `me`, who cannot see `hands[me]`. Returns the group
/// every pointed-at card belongs to, mine included.
pub fn decode(
    code: &Code,
    hinter: Player,
    hint: &Hint,
    me: Player,
    hands: &[Vec<Card>],
) -> Option<Vec<Restriction>> {
    let others = others_of(hinter, hands.len());
    let target = others.iter().position(|&player| player == hint.player)?;
    let residues = code.residues_at(target * TOKENS + token_index(&hint.hinted)?)?;

    let mut restrictions = Vec::new();
    for (index, component) in code.components.iter().enumerate() {
        let base = component.axis.base();
        let mut groups = Vec::with_capacity(others.len());
        let mut seen = 0;
        for (seat, &player) in others.iter().enumerate() {
            if player == me {
                groups.push(None);
            } else {
                let group = component
                    .axis
                    .group_of(&card_at(hands, player, component.columns[seat]))?;
                seen += group;
                groups.push(Some(group));
            }
        }
        for (seat, &player) in others.iter().enumerate() {
            let column = match component.columns[seat] {
                Some(column) => column,
                None => continue,
            };
            let group = groups[seat].unwrap_or((residues[index] + base - seen % base) % base);
            restrictions.push(Restriction {
                player,
                column,
                component: index,
                group,
            });
        }
    }
    Some(restrictions)
}
