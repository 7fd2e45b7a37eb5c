use super::ColorClass;
use crate::config::Theme;

/// An sRGB colour.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Colour {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Colour {
    pub const fn from_hex(hex: u32) -> Colour {
        Colour {
            r: ((hex >> 16) & 0xff) as u8,
            g: ((hex >> 8) & 0xff) as u8,
            b: (hex & 0xff) as u8,
        }
    }

    /// Components scaled to `0.0..=1.0`, as PDF colour operators want them.
    pub fn to_unit(self) -> [f32; 3] {
        [
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
        ]
    }
}

/// Every colour a theme needs.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Palette {
    pub background: Colour,
    pub text: Colour,
    /// Line numbers, metadata and other secondary text
    pub muted: Colour,
    pub link: Colour,
    keyword: Colour,
    string: Colour,
    comment: Colour,
    number: Colour,
    function: Colour,
    class: Colour,
    builtin: Colour,
    literal: Colour,
    variable: Colour,
    operator: Colour,
    punctuation: Colour,
}

const LIGHT: Palette = Palette {
    background: Colour::from_hex(0xFFFFFF),
    text: Colour::from_hex(0x000000),
    muted: Colour::from_hex(0x808080),
    link: Colour::from_hex(0x0000EE),
    keyword: Colour::from_hex(0x0000FF),
    string: Colour::from_hex(0x008000),
    comment: Colour::from_hex(0x808080),
    number: Colour::from_hex(0xFF0000),
    function: Colour::from_hex(0x000080),
    class: Colour::from_hex(0x800080),
    builtin: Colour::from_hex(0x000080),
    literal: Colour::from_hex(0x0000FF),
    variable: Colour::from_hex(0x000000),
    operator: Colour::from_hex(0x000000),
    punctuation: Colour::from_hex(0x000000),
};

const DARK: Palette = Palette {
    background: Colour::from_hex(0x1E1E1E),
    text: Colour::from_hex(0xD4D4D4),
    muted: Colour::from_hex(0x858585),
    link: Colour::from_hex(0x4FC1FF),
    keyword: Colour::from_hex(0x569CD6),
    string: Colour::from_hex(0xCE9178),
    comment: Colour::from_hex(0x6A9955),
    number: Colour::from_hex(0xB5CEA8),
    function: Colour::from_hex(0xDCDCAA),
    class: Colour::from_hex(0x4EC9B0),
    builtin: Colour::from_hex(0xDCDCAA),
    literal: Colour::from_hex(0x569CD6),
    variable: Colour::from_hex(0x9CDCFE),
    operator: Colour::from_hex(0xD4D4D4),
    punctuation: Colour::from_hex(0xD4D4D4),
};

impl Palette {
    pub fn for_theme(theme: Theme) -> &'static Palette {
        match theme {
            Theme::Light => &LIGHT,
            Theme::Dark => &DARK,
        }
    }

    pub fn colour(&self, class: ColorClass) -> Colour {
        match class {
            ColorClass::Keyword => self.keyword,
            ColorClass::String => self.string,
            ColorClass::Comment => self.comment,
            ColorClass::Number => self.number,
            ColorClass::Function => self.function,
            ColorClass::Class => self.class,
            ColorClass::Builtin => self.builtin,
            ColorClass::Literal => self.literal,
            ColorClass::Variable => self.variable,
            ColorClass::Operator => self.operator,
            ColorClass::Punctuation => self.punctuation,
            ColorClass::Plain => self.text,
        }
    }
}
