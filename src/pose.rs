use std::{fmt, str::FromStr};

use thiserror::Error;

/// A catalog key that cannot be decoded into a [`ClassifiedPose`].
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum PoseKeyError {
    #[error("malformed pose key at byte {position}: {message}")]
    Syntax {
        position: usize,
        message: &'static str,
    },
    #[error("unknown pose key field `{0}`")]
    UnknownField(String),
    #[error("pose key field `{0}` given more than once")]
    DuplicateField(&'static str),
    #[error("pose key is missing field `{0}`")]
    MissingField(&'static str),
    #[error("`{value}` is not a known {field}")]
    UnknownValue { field: &'static str, value: String },
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum KeyValue {
    Text(String),
    Int(i64),
}

impl fmt::Display for KeyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyValue::Text(s) => write!(f, "\"{s}\""),
            KeyValue::Int(v) => write!(f, "{v}"),
        }
    }
}

/// A closed set of values one pose field can take.
///
/// `index` is the position in `ALL` and is what gets serialized.
pub trait Category: Copy + PartialEq + Sized + 'static {
    const FIELD: &'static str;
    const ALL: &'static [Self];

    fn index(&self) -> usize;

    fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }
}

macro_rules! text_category {
    ($ty:ident, $field:literal, [$($variant:ident => $literal:literal),+ $(,)?]) => {
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
        pub enum $ty {
            $($variant),+
        }

        impl $ty {
            pub fn literal(&self) -> &'static str {
                match self {
                    $($ty::$variant => $literal),+
                }
            }

            fn from_literal(value: &str) -> Option<Self> {
                match value {
                    $($literal => Some($ty::$variant),)+
                    _ => None,
                }
            }
        }

        impl Category for $ty {
            const FIELD: &'static str = $field;
            const ALL: &'static [Self] = &[$($ty::$variant),+];

            fn index(&self) -> usize {
                *self as usize
            }
        }
    };
}

text_category!(PoseName, "name", [
    Collected => "Collected",
    CrossedForward => "Corssed forward",
    Forward => "Forward",
    Backward => "Backward",
    InAirForward => "In air forward",
    InAirBackward => "In air backward",
    SlideOutside => "Slide outside",
    WrappedAround => "Wrapped around",
    CollectedHigh => "Collected high",
    CrossedBackward => "Crossed backward",
]);

text_category!(Height, "height", [
    Straight => "straight",
    Bent => "bent",
    Tiptoe => "tiptoe",
]);

text_category!(Leg, "leg", [
    Right => "right",
    Left => "left",
]);

text_category!(Direction, "direction", [
    North => "north",
    Northwest => "northwest",
    Northeast => "northeast",
]);

text_category!(Lean, "lean", [
    Straight => "straight",
    Forward => "forward",
    Backward => "backward",
]);

/// Body rotation, in degrees.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RotationAngle {
    Deg0,
    Deg30,
    Deg60,
    Deg90,
    Deg120,
    Deg150,
    Deg180,
    Deg270,
    Deg360,
}

impl RotationAngle {
    pub fn degrees(&self) -> u16 {
        match self {
            RotationAngle::Deg0 => 0,
            RotationAngle::Deg30 => 30,
            RotationAngle::Deg60 => 60,
            RotationAngle::Deg90 => 90,
            RotationAngle::Deg120 => 120,
            RotationAngle::Deg150 => 150,
            RotationAngle::Deg180 => 180,
            RotationAngle::Deg270 => 270,
            RotationAngle::Deg360 => 360,
        }
    }

    fn from_degrees(value: i64) -> Option<Self> {
        Self::ALL.iter().copied().find(|a| i64::from(a.degrees()) == value)
    }
}

impl Category for RotationAngle {
    const FIELD: &'static str = "angle";
    const ALL: &'static [Self] = &[
        RotationAngle::Deg0,
        RotationAngle::Deg30,
        RotationAngle::Deg60,
        RotationAngle::Deg90,
        RotationAngle::Deg120,
        RotationAngle::Deg150,
        RotationAngle::Deg180,
        RotationAngle::Deg270,
        RotationAngle::Deg360,
    ];

    fn index(&self) -> usize {
        *self as usize
    }
}

/// Slider position, 0 through 7.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Slider(u8);

impl Slider {
    pub const MAX: u8 = 7;

    pub fn new(value: u8) -> Option<Self> {
        (value <= Self::MAX).then_some(Slider(value))
    }

    pub fn value(&self) -> u8 {
        self.0
    }
}

impl Category for Slider {
    const FIELD: &'static str = "slider";
    const ALL: &'static [Self] = &[
        Slider(0),
        Slider(1),
        Slider(2),
        Slider(3),
        Slider(4),
        Slider(5),
        Slider(6),
        Slider(7),
    ];

    fn index(&self) -> usize {
        self.0 as usize
    }
}

/// A pose label decoded from a catalog key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ClassifiedPose {
    name: PoseName,
    height: Height,
    leg: Leg,
    direction: Direction,
    angle: RotationAngle,
    slider: Slider,
    lean: Lean,
}

impl ClassifiedPose {
    pub fn new(
        name: PoseName,
        height: Height,
        leg: Leg,
        direction: Direction,
        angle: RotationAngle,
        slider: Slider,
        lean: Lean,
    ) -> Self {
        Self {
            name,
            height,
            leg,
            direction,
            angle,
            slider,
            lean,
        }
    }

    /// Strictly decodes a key such as
    /// `name="Forward", height="straight", leg="right", direction="north", slider=0, angle=0, lean="straight"`,
    /// optionally wrapped in `Pose(...)`.
    pub fn from_key(key: &str) -> Result<Self, PoseKeyError> {
        let mut name = None;
        let mut height = None;
        let mut leg = None;
        let mut direction = None;
        let mut angle = None;
        let mut slider = None;
        let mut lean = None;

        for (field, value) in parse_fields(key)? {
            match field.as_str() {
                "name" => set_once(&mut name, decode_text(&value, PoseName::from_literal)?)?,
                "height" => set_once(&mut height, decode_text(&value, Height::from_literal)?)?,
                "leg" => set_once(&mut leg, decode_text(&value, Leg::from_literal)?)?,
                "direction" => {
                    set_once(&mut direction, decode_text(&value, Direction::from_literal)?)?
                }
                "lean" => set_once(&mut lean, decode_text(&value, Lean::from_literal)?)?,
                "angle" => set_once(
                    &mut angle,
                    decode_int(&value, RotationAngle::from_degrees)?,
                )?,
                "slider" => set_once(
                    &mut slider,
                    decode_int(&value, |v| u8::try_from(v).ok().and_then(Slider::new))?,
                )?,
                other => return Err(PoseKeyError::UnknownField(other.to_string())),
            }
        }

        Ok(Self {
            name: require(name)?,
            height: require(height)?,
            leg: require(leg)?,
            direction: require(direction)?,
            angle: require(angle)?,
            slider: require(slider)?,
            lean: require(lean)?,
        })
    }

    pub fn name(&self) -> PoseName {
        self.name
    }

    pub fn height(&self) -> Height {
        self.height
    }

    pub fn leg(&self) -> Leg {
        self.leg
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn angle(&self) -> RotationAngle {
        self.angle
    }

    pub fn slider(&self) -> Slider {
        self.slider
    }

    pub fn lean(&self) -> Lean {
        self.lean
    }

    /// Canonical key string for this pose.
    pub fn key(&self) -> String {
        format!(
            "name=\"{}\", height=\"{}\", leg=\"{}\", direction=\"{}\", slider={}, angle={}, lean=\"{}\"",
            self.name.literal(),
            self.height.literal(),
            self.leg.literal(),
            self.direction.literal(),
            self.slider.value(),
            self.angle.degrees(),
            self.lean.literal(),
        )
    }
}

impl FromStr for ClassifiedPose {
    type Err = PoseKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_key(s)
    }
}

impl fmt::Display for ClassifiedPose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key())
    }
}

fn set_once<T: Category>(slot: &mut Option<T>, value: T) -> Result<(), PoseKeyError> {
    if slot.is_some() {
        return Err(PoseKeyError::DuplicateField(T::FIELD));
    }
    *slot = Some(value);
    Ok(())
}

fn require<T: Category>(slot: Option<T>) -> Result<T, PoseKeyError> {
    slot.ok_or(PoseKeyError::MissingField(T::FIELD))
}

fn decode_text<T: Category>(
    value: &KeyValue,
    lookup: impl Fn(&str) -> Option<T>,
) -> Result<T, PoseKeyError> {
    let found = match value {
        KeyValue::Text(s) => lookup(s),
        KeyValue::Int(_) => None,
    };
    found.ok_or_else(|| PoseKeyError::UnknownValue {
        field: T::FIELD,
        value: value.to_string(),
    })
}

fn decode_int<T: Category>(
    value: &KeyValue,
    lookup: impl Fn(i64) -> Option<T>,
) -> Result<T, PoseKeyError> {
    let found = match value {
        KeyValue::Int(v) => lookup(*v),
        KeyValue::Text(_) => None,
    };
    found.ok_or_else(|| PoseKeyError::UnknownValue {
        field: T::FIELD,
        value: value.to_string(),
    })
}

fn parse_fields(key: &str) -> Result<Vec<(String, KeyValue)>, PoseKeyError> {
    let trimmed = key.trim();
    let offset = key.len() - key.trim_start().len();
    let (body, base) = match trimmed.strip_prefix("Pose(") {
        Some(rest) => {
            let inner = rest.strip_suffix(')').ok_or(PoseKeyError::Syntax {
                position: offset + trimmed.len(),
                message: "missing closing parenthesis",
            })?;
            (inner, offset + "Pose(".len())
        }
        None => (trimmed, offset),
    };

    let mut scanner = Scanner {
        bytes: body.as_bytes(),
        pos: 0,
        base,
    };
    let mut fields = Vec::new();

    loop {
        scanner.skip_ws();
        if scanner.at_end() {
            break;
        }
        let field = scanner.ident()?;
        scanner.skip_ws();
        scanner.expect(b'=', "expected `=` after field name")?;
        scanner.skip_ws();
        let value = scanner.value()?;
        fields.push((field, value));
        scanner.skip_ws();
        if scanner.at_end() {
            break;
        }
        scanner.expect(b',', "expected `,` between fields")?;
    }

    if fields.is_empty() {
        return Err(PoseKeyError::Syntax {
            position: base,
            message: "empty pose key",
        });
    }
    Ok(fields)
}

struct Scanner<'a> {
    bytes: &'a [u8],
    pos: usize,
    base: usize,
}

impl Scanner<'_> {
    fn at_end(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn error(&self, message: &'static str) -> PoseKeyError {
        PoseKeyError::Syntax {
            position: self.base + self.pos,
            message,
        }
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(|b| b.is_ascii_whitespace()) {
            self.pos += 1;
        }
    }

    fn expect(&mut self, byte: u8, message: &'static str) -> Result<(), PoseKeyError> {
        if self.peek() == Some(byte) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.error(message))
        }
    }

    fn ident(&mut self) -> Result<String, PoseKeyError> {
        let start = self.pos;
        match self.peek() {
            Some(b) if b.is_ascii_alphabetic() || b == b'_' => self.pos += 1,
            _ => return Err(self.error("expected field name")),
        }
        while self
            .peek()
            .is_some_and(|b| b.is_ascii_alphanumeric() || b == b'_')
        {
            self.pos += 1;
        }
        Ok(String::from_utf8_lossy(&self.bytes[start..self.pos]).into_owned())
    }

    fn value(&mut self) -> Result<KeyValue, PoseKeyError> {
        match self.peek() {
            Some(quote @ (b'"' | b'\'')) => {
                self.pos += 1;
                let start = self.pos;
                while self.peek().is_some_and(|b| b != quote) {
                    self.pos += 1;
                }
                if self.at_end() {
                    return Err(self.error("unterminated string"));
                }
                let text = String::from_utf8_lossy(&self.bytes[start..self.pos]).into_owned();
                self.pos += 1;
                Ok(KeyValue::Text(text))
            }
            Some(b) if b == b'-' || b.is_ascii_digit() => {
                let start = self.pos;
                self.pos += 1;
                while self.peek().is_some_and(|b| b.is_ascii_digit()) {
                    self.pos += 1;
                }
                std::str::from_utf8(&self.bytes[start..self.pos])
                    .ok()
                    .and_then(|s| s.parse::<i64>().ok())
                    .map(KeyValue::Int)
                    .ok_or_else(|| self.error("invalid integer"))
            }
            _ => Err(self.error("expected quoted string or integer")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FORWARD: &str = r#"name="Forward", height="straight", leg="right", direction="north", slider=0, angle=0, lean="straight""#;

    #[test]
    fn decodes_reference_key() {
        let pose = ClassifiedPose::from_key(FORWARD).unwrap();
        assert_eq!(pose.name(), PoseName::Forward);
        assert_eq!(pose.name().index(), 2);
        assert_eq!(pose.height(), Height::Straight);
        assert_eq!(pose.leg(), Leg::Right);
        assert_eq!(pose.direction(), Direction::North);
        assert_eq!(pose.angle(), RotationAngle::Deg0);
        assert_eq!(pose.slider().value(), 0);
        assert_eq!(pose.lean(), Lean::Straight);
    }

    #[test]
    fn accepts_wrapper_quotes_and_any_field_order() {
        let key = "Pose(lean='backward', angle=270, slider=7, direction='northeast', leg='left', height='tiptoe', name='Corssed forward')";
        let pose: ClassifiedPose = key.parse().unwrap();
        assert_eq!(pose.name(), PoseName::CrossedForward);
        assert_eq!(pose.height(), Height::Tiptoe);
        assert_eq!(pose.leg(), Leg::Left);
        assert_eq!(pose.direction(), Direction::Northeast);
        assert_eq!(pose.angle().index(), 7);
        assert_eq!(pose.slider().index(), 7);
        assert_eq!(pose.lean(), Lean::Backward);
    }

    #[test]
    fn canonical_key_round_trips() {
        let pose = ClassifiedPose::from_key(FORWARD).unwrap();
        assert_eq!(pose.key(), FORWARD);
    }

    #[test]
    fn rejects_values_outside_tables() {
        let bad_name = FORWARD.replace("Forward", "Moonwalk");
        assert_eq!(
            ClassifiedPose::from_key(&bad_name),
            Err(PoseKeyError::UnknownValue {
                field: "name",
                value: "\"Moonwalk\"".to_string()
            })
        );

        let bad_angle = FORWARD.replace("angle=0", "angle=45");
        assert!(matches!(
            ClassifiedPose::from_key(&bad_angle),
            Err(PoseKeyError::UnknownValue { field: "angle", .. })
        ));

        let bad_slider = FORWARD.replace("slider=0", "slider=8");
        assert!(matches!(
            ClassifiedPose::from_key(&bad_slider),
            Err(PoseKeyError::UnknownValue {
                field: "slider",
                ..
            })
        ));

        let quoted_angle = FORWARD.replace("angle=0", "angle=\"0\"");
        assert!(matches!(
            ClassifiedPose::from_key(&quoted_angle),
            Err(PoseKeyError::UnknownValue { field: "angle", .. })
        ));
    }

    #[test]
    fn rejects_structural_problems() {
        let missing = FORWARD.replace(r#", lean="straight""#, "");
        assert_eq!(
            ClassifiedPose::from_key(&missing),
            Err(PoseKeyError::MissingField("lean"))
        );

        let duplicate = format!("{FORWARD}, leg=\"left\"");
        assert_eq!(
            ClassifiedPose::from_key(&duplicate),
            Err(PoseKeyError::DuplicateField("leg"))
        );

        let unknown = format!("{FORWARD}, tempo=3");
        assert_eq!(
            ClassifiedPose::from_key(&unknown),
            Err(PoseKeyError::UnknownField("tempo".to_string()))
        );

        assert!(matches!(
            ClassifiedPose::from_key("__import__('os')"),
            Err(PoseKeyError::Syntax { .. })
        ));
        assert!(matches!(
            ClassifiedPose::from_key("Pose(name=\"Forward\""),
            Err(PoseKeyError::Syntax { .. })
        ));
        assert!(matches!(
            ClassifiedPose::from_key(""),
            Err(PoseKeyError::Syntax { .. })
        ));
    }

    #[test]
    fn tables_have_expected_sizes() {
        assert_eq!(PoseName::ALL.len(), 10);
        assert_eq!(Height::ALL.len(), 3);
        assert_eq!(Leg::ALL.len(), 2);
        assert_eq!(Direction::ALL.len(), 3);
        assert_eq!(RotationAngle::ALL.len(), 9);
        assert_eq!(Slider::ALL.len(), 8);
        assert_eq!(Lean::ALL.len(), 3);
        assert_eq!(PoseName::from_index(9), Some(PoseName::CrossedBackward));
        assert_eq!(Lean::from_index(3), None);
    }
}
