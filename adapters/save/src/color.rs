use color_lines_core::BallColor;
use serde::Serializer;
use serde_json::{Map, Value};

/// SVG 1.1 color keywords, sorted by name and matched case-insensitively.
const NAMED_COLORS: [(&str, BallColor); 147] = [
    ("aliceblue", BallColor::from_rgb(240, 248, 255)),
    ("antiquewhite", BallColor::from_rgb(250, 235, 215)),
    ("aqua", BallColor::from_rgb(0, 255, 255)),
    ("aquamarine", BallColor::from_rgb(127, 255, 212)),
    ("azure", BallColor::from_rgb(240, 255, 255)),
    ("beige", BallColor::from_rgb(245, 245, 220)),
    ("bisque", BallColor::from_rgb(255, 228, 196)),
    ("black", BallColor::from_rgb(0, 0, 0)),
    ("blanchedalmond", BallColor::from_rgb(255, 235, 205)),
    ("blue", BallColor::from_rgb(0, 0, 255)),
    ("blueviolet", BallColor::from_rgb(138, 43, 226)),
    ("brown", BallColor::from_rgb(165, 42, 42)),
    ("burlywood", BallColor::from_rgb(222, 184, 135)),
    ("cadetblue", BallColor::from_rgb(95, 158, 160)),
    ("chartreuse", BallColor::from_rgb(127, 255, 0)),
    ("chocolate", BallColor::from_rgb(210, 105, 30)),
    ("coral", BallColor::from_rgb(255, 127, 80)),
    ("cornflowerblue", BallColor::from_rgb(100, 149, 237)),
    ("cornsilk", BallColor::from_rgb(255, 248, 220)),
    ("crimson", BallColor::from_rgb(220, 20, 60)),
    ("cyan", BallColor::from_rgb(0, 255, 255)),
    ("darkblue", BallColor::from_rgb(0, 0, 139)),
    ("darkcyan", BallColor::from_rgb(0, 139, 139)),
    ("darkgoldenrod", BallColor::from_rgb(184, 134, 11)),
    ("darkgray", BallColor::from_rgb(169, 169, 169)),
    ("darkgreen", BallColor::from_rgb(0, 100, 0)),
    ("darkgrey", BallColor::from_rgb(169, 169, 169)),
    ("darkkhaki", BallColor::from_rgb(189, 183, 107)),
    ("darkmagenta", BallColor::from_rgb(139, 0, 139)),
    ("darkolivegreen", BallColor::from_rgb(85, 107, 47)),
    ("darkorange", BallColor::from_rgb(255, 140, 0)),
    ("darkorchid", BallColor::from_rgb(153, 50, 204)),
    ("darkred", BallColor::from_rgb(139, 0, 0)),
    ("darksalmon", BallColor::from_rgb(233, 150, 122)),
    ("darkseagreen", BallColor::from_rgb(143, 188, 143)),
    ("darkslateblue", BallColor::from_rgb(72, 61, 139)),
    ("darkslategray", BallColor::from_rgb(47, 79, 79)),
    ("darkslategrey", BallColor::from_rgb(47, 79, 79)),
    ("darkturquoise", BallColor::from_rgb(0, 206, 209)),
    ("darkviolet", BallColor::from_rgb(148, 0, 211)),
    ("deeppink", BallColor::from_rgb(255, 20, 147)),
    ("deepskyblue", BallColor::from_rgb(0, 191, 255)),
    ("dimgray", BallColor::from_rgb(105, 105, 105)),
    ("dimgrey", BallColor::from_rgb(105, 105, 105)),
    ("dodgerblue", BallColor::from_rgb(30, 144, 255)),
    ("firebrick", BallColor::from_rgb(178, 34, 34)),
    ("floralwhite", BallColor::from_rgb(255, 250, 240)),
    ("forestgreen", BallColor::from_rgb(34, 139, 34)),
    ("fuchsia", BallColor::from_rgb(255, 0, 255)),
    ("gainsboro", BallColor::from_rgb(220, 220, 220)),
    ("ghostwhite", BallColor::from_rgb(248, 248, 255)),
    ("gold", BallColor::from_rgb(255, 215, 0)),
    ("goldenrod", BallColor::from_rgb(218, 165, 32)),
    ("gray", BallColor::from_rgb(128, 128, 128)),
    ("green", BallColor::from_rgb(0, 128, 0)),
    ("greenyellow", BallColor::from_rgb(173, 255, 47)),
    ("grey", BallColor::from_rgb(128, 128, 128)),
    ("honeydew", BallColor::from_rgb(240, 255, 240)),
    ("hotpink", BallColor::from_rgb(255, 105, 180)),
    ("indianred", BallColor::from_rgb(205, 92, 92)),
    ("indigo", BallColor::from_rgb(75, 0, 130)),
    ("ivory", BallColor::from_rgb(255, 255, 240)),
    ("khaki", BallColor::from_rgb(240, 230, 140)),
    ("lavender", BallColor::from_rgb(230, 230, 250)),
    ("lavenderblush", BallColor::from_rgb(255, 240, 245)),
    ("lawngreen", BallColor::from_rgb(124, 252, 0)),
    ("lemonchiffon", BallColor::from_rgb(255, 250, 205)),
    ("lightblue", BallColor::from_rgb(173, 216, 230)),
    ("lightcoral", BallColor::from_rgb(240, 128, 128)),
    ("lightcyan", BallColor::from_rgb(224, 255, 255)),
    ("lightgoldenrodyellow", BallColor::from_rgb(250, 250, 210)),
    ("lightgray", BallColor::from_rgb(211, 211, 211)),
    ("lightgreen", BallColor::from_rgb(144, 238, 144)),
    ("lightgrey", BallColor::from_rgb(211, 211, 211)),
    ("lightpink", BallColor::from_rgb(255, 182, 193)),
    ("lightsalmon", BallColor::from_rgb(255, 160, 122)),
    ("lightseagreen", BallColor::from_rgb(32, 178, 170)),
    ("lightskyblue", BallColor::from_rgb(135, 206, 250)),
    ("lightslategray", BallColor::from_rgb(119, 136, 153)),
    ("lightslategrey", BallColor::from_rgb(119, 136, 153)),
    ("lightsteelblue", BallColor::from_rgb(176, 196, 222)),
    ("lightyellow", BallColor::from_rgb(255, 255, 224)),
    ("lime", BallColor::from_rgb(0, 255, 0)),
    ("limegreen", BallColor::from_rgb(50, 205, 50)),
    ("linen", BallColor::from_rgb(250, 240, 230)),
    ("magenta", BallColor::from_rgb(255, 0, 255)),
    ("maroon", BallColor::from_rgb(128, 0, 0)),
    ("mediumaquamarine", BallColor::from_rgb(102, 205, 170)),
    ("mediumblue", BallColor::from_rgb(0, 0, 205)),
    ("mediumorchid", BallColor::from_rgb(186, 85, 211)),
    ("mediumpurple", BallColor::from_rgb(147, 112, 219)),
    ("mediumseagreen", BallColor::from_rgb(60, 179, 113)),
    ("mediumslateblue", BallColor::from_rgb(123, 104, 238)),
    ("mediumspringgreen", BallColor::from_rgb(0, 250, 154)),
    ("mediumturquoise", BallColor::from_rgb(72, 209, 204)),
    ("mediumvioletred", BallColor::from_rgb(199, 21, 133)),
    ("midnightblue", BallColor::from_rgb(25, 25, 112)),
    ("mintcream", BallColor::from_rgb(245, 255, 250)),
    ("mistyrose", BallColor::from_rgb(255, 228, 225)),
    ("moccasin", BallColor::from_rgb(255, 228, 181)),
    ("navajowhite", BallColor::from_rgb(255, 222, 173)),
    ("navy", BallColor::from_rgb(0, 0, 128)),
    ("oldlace", BallColor::from_rgb(253, 245, 230)),
    ("olive", BallColor::from_rgb(128, 128, 0)),
    ("olivedrab", BallColor::from_rgb(107, 142, 35)),
    ("orange", BallColor::from_rgb(255, 165, 0)),
    ("orangered", BallColor::from_rgb(255, 69, 0)),
    ("orchid", BallColor::from_rgb(218, 112, 214)),
    ("palegoldenrod", BallColor::from_rgb(238, 232, 170)),
    ("palegreen", BallColor::from_rgb(152, 251, 152)),
    ("paleturquoise", BallColor::from_rgb(175, 238, 238)),
    ("palevioletred", BallColor::from_rgb(219, 112, 147)),
    ("papayawhip", BallColor::from_rgb(255, 239, 213)),
    ("peachpuff", BallColor::from_rgb(255, 218, 185)),
    ("peru", BallColor::from_rgb(205, 133, 63)),
    ("pink", BallColor::from_rgb(255, 192, 203)),
    ("plum", BallColor::from_rgb(221, 160, 221)),
    ("powderblue", BallColor::from_rgb(176, 224, 230)),
    ("purple", BallColor::from_rgb(128, 0, 128)),
    ("red", BallColor::from_rgb(255, 0, 0)),
    ("rosybrown", BallColor::from_rgb(188, 143, 143)),
    ("royalblue", BallColor::from_rgb(65, 105, 225)),
    ("saddlebrown", BallColor::from_rgb(139, 69, 19)),
    ("salmon", BallColor::from_rgb(250, 128, 114)),
    ("sandybrown", BallColor::from_rgb(244, 164, 96)),
    ("seagreen", BallColor::from_rgb(46, 139, 87)),
    ("seashell", BallColor::from_rgb(255, 245, 238)),
    ("sienna", BallColor::from_rgb(160, 82, 45)),
    ("silver", BallColor::from_rgb(192, 192, 192)),
    ("skyblue", BallColor::from_rgb(135, 206, 235)),
    ("slateblue", BallColor::from_rgb(106, 90, 205)),
    ("slategray", BallColor::from_rgb(112, 128, 144)),
    ("slategrey", BallColor::from_rgb(112, 128, 144)),
    ("snow", BallColor::from_rgb(255, 250, 250)),
    ("springgreen", BallColor::from_rgb(0, 255, 127)),
    ("steelblue", BallColor::from_rgb(70, 130, 180)),
    ("tan", BallColor::from_rgb(210, 180, 140)),
    ("teal", BallColor::from_rgb(0, 128, 128)),
    ("thistle", BallColor::from_rgb(216, 191, 216)),
    ("tomato", BallColor::from_rgb(255, 99, 71)),
    ("turquoise", BallColor::from_rgb(64, 224, 208)),
    ("violet", BallColor::from_rgb(238, 130, 238)),
    ("wheat", BallColor::from_rgb(245, 222, 179)),
    ("white", BallColor::from_rgb(255, 255, 255)),
    ("whitesmoke", BallColor::from_rgb(245, 245, 245)),
    ("yellow", BallColor::from_rgb(255, 255, 0)),
    ("yellowgreen", BallColor::from_rgb(154, 205, 50)),
];

/// Formats a color as `#rrggbb`.
pub(crate) fn to_hex(color: BallColor) -> String {
    format!(
        "#{:02x}{:02x}{:02x}",
        color.red(),
        color.green(),
        color.blue()
    )
}

pub(crate) fn serialize_hex<S>(color: &BallColor, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&to_hex(*color))
}

/// Reads a color stored either as text or as an `{r, g, b}` object.
pub(crate) fn from_value(value: &Value) -> Option<BallColor> {
    match value {
        Value::String(text) => from_text(text),
        Value::Object(channels) => from_channels(channels),
        _ => None,
    }
}

fn from_text(text: &str) -> Option<BallColor> {
    let text = text.trim();
    if let Some(digits) = text.strip_prefix('#') {
        return from_hex_digits(digits);
    }
    let name = text.to_ascii_lowercase();
    NAMED_COLORS
        .binary_search_by(|(candidate, _)| (*candidate).cmp(name.as_str()))
        .ok()
        .and_then(|index| NAMED_COLORS.get(index))
        .map(|(_, color)| *color)
}

fn from_hex_digits(digits: &str) -> Option<BallColor> {
    if !digits.chars().all(|digit| digit.is_ascii_hexdigit()) {
        return None;
    }
    match digits.len() {
        3 => {
            let mut nibbles = digits
                .chars()
                .filter_map(|digit| digit.to_digit(16))
                .filter_map(|nibble| u8::try_from(nibble * 17).ok());
            Some(BallColor::from_rgb(
                nibbles.next()?,
                nibbles.next()?,
                nibbles.next()?,
            ))
        }
        6 => Some(BallColor::from_rgb(
            u8::from_str_radix(digits.get(0..2)?, 16).ok()?,
            u8::from_str_radix(digits.get(2..4)?, 16).ok()?,
            u8::from_str_radix(digits.get(4..6)?, 16).ok()?,
        )),
        _ => None,
    }
}

fn from_channels(channels: &Map<String, Value>) -> Option<BallColor> {
    let channel = |key: &str| -> Option<u8> {
        match channels.get(key) {
            None => Some(0),
            Some(value) => value.as_i64().and_then(|number| u8::try_from(number).ok()),
        }
    };
    Some(BallColor::from_rgb(channel("r")?, channel("g")?, channel("b")?))
}
