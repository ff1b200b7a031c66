use std::env;
use std::fs::File;
use std::io::Write;
use std::path::Path;

fn main() {
    let out_dir = env::var("OUT_DIR").unwrap();
    let dest_path = Path::new(&out_dir).join("key_ids.rs");
    let mut f = File::create(&dest_path).unwrap();

    // Generate the KeyId newtype wrapper
    writeln!(
        f,
        r#"
/// A canonical, layout-independent key identifier.
///
/// Values outside `0xE000..=0xEFFF` are Unicode scalar values. The range
/// `0xE000..=0xEFFF` holds named (non-character) keys and dead keys use the
/// combining diacritical marks block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[repr(transparent)]
pub struct KeyId(pub u32);

impl KeyId {{
    /// Get the raw numeric value
    pub const fn code(self) -> u32 {{
        self.0
    }}

    /// Get the display name of this key
    pub fn name(self) -> String {{
        key_name(self)
    }}
}}

impl From<u32> for KeyId {{
    fn from(code: u32) -> Self {{
        KeyId(code)
    }}
}}

impl From<char> for KeyId {{
    fn from(c: char) -> Self {{
        KeyId(c as u32)
    }}
}}

impl From<KeyId> for u32 {{
    fn from(key: KeyId) -> Self {{
        key.0
    }}
}}

impl fmt::Display for KeyId {{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {{
        write!(f, "{{}}", self.name())
    }}
}}

impl FromStr for KeyId {{
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {{
        key_from_name(s).ok_or_else(|| format!("Unknown key: {{}}", s))
    }}
}}
"#
    )
    .unwrap();

    println!("cargo:rerun-if-changed=build.rs");
}
