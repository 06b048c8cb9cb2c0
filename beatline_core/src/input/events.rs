use crate::chart::Lane;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputCommand {
    Press(Lane),
    Pause,
    Resume,
    Quit,
}

impl InputCommand {
    /// Maps a keyboard character: lane keys press, `p` pauses, `r` resumes, `q` quits.
    pub fn from_char(c: char) -> Option<Self> {
        match c.to_ascii_lowercase() {
            'p' => Some(Self::Pause),
            'r' => Some(Self::Resume),
            'q' => Some(Self::Quit),
            other => Lane::from_key(other.encode_utf8(&mut [0; 4])).map(Self::Press),
        }
    }
}
