//! Command parsing for player input.

/// Direction for movement commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Direction {
    /// North.
    North,
    /// South.
    South,
    /// East.
    East,
    /// West.
    West,
    /// Up.
    Up,
    /// Down.
    Down,
    /// Northeast.
    Northeast,
    /// Northwest.
    Northwest,
    /// Southeast.
    Southeast,
    /// Southwest.
    Southwest,
}

impl Direction {
    /// Parse a direction from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "n" | "north" => Some(Self::North),
            "s" | "south" => Some(Self::South),
            "e" | "east" => Some(Self::East),
            "w" | "west" => Some(Self::West),
            "u" | "up" => Some(Self::Up),
            "d" | "down" => Some(Self::Down),
            "ne" | "northeast" => Some(Self::Northeast),
            "nw" | "northwest" => Some(Self::Northwest),
            "se" | "southeast" => Some(Self::Southeast),
            "sw" | "southwest" => Some(Self::Southwest),
            _ => None,
        }
    }
}

/// Verbs the game understands, after synonym folding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    /// Describe the surroundings.
    Look,
    /// Look closely at one thing.
    Examine,
    /// Pick something up.
    Take,
    /// Put something down.
    Drop,
    /// Open a container.
    Open,
    /// Close a container.
    Close,
    /// Read something printed.
    Read,
    /// List carried items.
    Inventory,
    /// End the game.
    Quit,
}

impl Verb {
    /// The verb as it appears in replies.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Look => "look at",
            Self::Examine => "examine",
            Self::Take => "take",
            Self::Drop => "drop",
            Self::Open => "open",
            Self::Close => "close",
            Self::Read => "read",
            Self::Inventory => "inventory",
            Self::Quit => "quit",
        }
    }
}

/// A parsed player command: a verb with an optional object noun.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Blank input.
    Empty,
    /// Move in a direction.
    Move(Direction),
    /// Any other verb.
    Act {
        /// The folded verb.
        verb: Verb,
        /// The object noun, lowercased, without articles.
        noun: Option<String>,
    },
    /// The first word is not a known verb.
    Unknown(String),
}

const MOVE_VERBS: &[&str] = &["go", "walk", "run", "head", "travel"];
const LOOK_VERBS: &[&str] = &["look", "l"];
const EXAMINE_VERBS: &[&str] = &["examine", "x", "inspect", "describe"];
const TAKE_VERBS: &[&str] = &["take", "get", "pick", "grab"];
const DROP_VERBS: &[&str] = &["drop", "discard"];
const OPEN_VERBS: &[&str] = &["open"];
const CLOSE_VERBS: &[&str] = &["close", "shut"];
const READ_VERBS: &[&str] = &["read", "skim"];
const INVENTORY_VERBS: &[&str] = &["inventory", "inv", "i"];
const QUIT_VERBS: &[&str] = &["quit", "q"];

/// Words dropped from the object phrase.
const NOISE_WORDS: &[&str] = &["the", "a", "an", "at", "up", "to", "small", "white"];

const VERB_TABLE: &[(&[&str], Verb)] = &[
    (LOOK_VERBS, Verb::Look),
    (EXAMINE_VERBS, Verb::Examine),
    (TAKE_VERBS, Verb::Take),
    (DROP_VERBS, Verb::Drop),
    (OPEN_VERBS, Verb::Open),
    (CLOSE_VERBS, Verb::Close),
    (READ_VERBS, Verb::Read),
    (INVENTORY_VERBS, Verb::Inventory),
    (QUIT_VERBS, Verb::Quit),
];

/// Parse a player input string into a command.
pub fn parse_command(input: &str) -> Command {
    let input = input.trim().to_lowercase();
    let words: Vec<&str> = input.split_whitespace().collect();
    let Some((&verb, rest)) = words.split_first() else {
        return Command::Empty;
    };

    if let Some(direction) = Direction::parse(verb) {
        return Command::Move(direction);
    }

    if MOVE_VERBS.contains(&verb) {
        return match rest.first().and_then(|w| Direction::parse(w)) {
            Some(direction) => Command::Move(direction),
            None if rest.is_empty() => Command::Act {
                verb: Verb::Look,
                noun: None,
            },
            None => Command::Unknown(input.clone()),
        };
    }

    let Some(&(_, folded)) = VERB_TABLE.iter().find(|(synonyms, _)| synonyms.contains(&verb)) else {
        return Command::Unknown(verb.to_string());
    };

    let noun = rest
        .iter()
        .rev()
        .find(|w| !NOISE_WORDS.contains(*w))
        .map(|w| w.to_string());

    // "look at mailbox" means examine.
    let verb = match (folded, &noun) {
        (Verb::Look, Some(_)) => Verb::Examine,
        _ => folded,
    };

    Command::Act { verb, noun }
}
