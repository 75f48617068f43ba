//! TXI texture sidecar keywords.
//!
//! A TXI file is a list of `keyword arguments` lines attached to a texture.
//! Only a handful of keywords matter to the scene graph; the rest are
//! recognised so they can be skipped cleanly.

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum TxiCommand {
    AlphaMean,
    ArturoHeight,
    ArturoWidth,
    BaselineHeight,
    Blending,
    BumpMapScaling,
    BumpMapTexture,
    BumpyShinyTexture,
    CanDownsample,
    CaretIndent,
    ChannelScale,
    ChannelTranslate,
    Clamp,
    Codepage,
    Cols,
    CompressTexture,
    ControllerScript,
    Cube,
    DbMapping,
    Decal,
    DefaultBpp,
    DefaultHeight,
    DefaultWidth,
    Distort,
    DistortAngle,
    DistortionAmplitude,
    DownsampleFactor,
    DownsampleMax,
    DownsampleMin,
    EnvMapTexture,
    FileRange,
    Filter,
    FontHeight,
    FontWidth,
    Fps,
    IsBumpMap,
    IsDoubleByte,
    IsLightMap,
    LowerRightCoords,
    MaxSizeHq,
    MaxSizeLq,
    MinSizeHq,
    MinSizeLq,
    Mipmap,
    NumChars,
    NumCharsPerSheet,
    NumX,
    NumY,
    OnDemand,
    Priority,
    ProcedureType,
    Rows,
    SpacingB,
    SpacingR,
    Speed,
    Temporary,
    TextureWidth,
    Unique,
    UpperLeftCoords,
    WaterHeight,
    WaterWidth,
    XboxDownsample,
}

const TXI_COMMANDS: [(&str, TxiCommand); 62] = [
    ("alphamean", TxiCommand::AlphaMean),
    ("arturoheight", TxiCommand::ArturoHeight),
    ("arturowidth", TxiCommand::ArturoWidth),
    ("baselineheight", TxiCommand::BaselineHeight),
    ("blending", TxiCommand::Blending),
    ("bumpmapscaling", TxiCommand::BumpMapScaling),
    ("bumpmaptexture", TxiCommand::BumpMapTexture),
    ("bumpyshinytexture", TxiCommand::BumpyShinyTexture),
    ("candownsample", TxiCommand::CanDownsample),
    ("caretindent", TxiCommand::CaretIndent),
    ("channelscale", TxiCommand::ChannelScale),
    ("channeltranslate", TxiCommand::ChannelTranslate),
    ("clamp", TxiCommand::Clamp),
    ("codepage", TxiCommand::Codepage),
    ("cols", TxiCommand::Cols),
    ("compresstexture", TxiCommand::CompressTexture),
    ("controllerscript", TxiCommand::ControllerScript),
    ("cube", TxiCommand::Cube),
    ("dbmapping", TxiCommand::DbMapping),
    ("decal", TxiCommand::Decal),
    ("defaultbpp", TxiCommand::DefaultBpp),
    ("defaultheight", TxiCommand::DefaultHeight),
    ("defaultwidth", TxiCommand::DefaultWidth),
    ("distort", TxiCommand::Distort),
    ("distortangle", TxiCommand::DistortAngle),
    ("distortionamplitude", TxiCommand::DistortionAmplitude),
    ("downsamplefactor", TxiCommand::DownsampleFactor),
    ("downsamplemax", TxiCommand::DownsampleMax),
    ("downsamplemin", TxiCommand::DownsampleMin),
    ("envmaptexture", TxiCommand::EnvMapTexture),
    ("filerange", TxiCommand::FileRange),
    ("filter", TxiCommand::Filter),
    ("fontheight", TxiCommand::FontHeight),
    ("fontwidth", TxiCommand::FontWidth),
    ("fps", TxiCommand::Fps),
    ("isbumpmap", TxiCommand::IsBumpMap),
    ("isdoublebyte", TxiCommand::IsDoubleByte),
    ("islightmap", TxiCommand::IsLightMap),
    ("lowerrightcoords", TxiCommand::LowerRightCoords),
    ("maxSizeHQ", TxiCommand::MaxSizeHq),
    ("maxSizeLQ", TxiCommand::MaxSizeLq),
    ("minSizeHQ", TxiCommand::MinSizeHq),
    ("minSizeLQ", TxiCommand::MinSizeLq),
    ("mipmap", TxiCommand::Mipmap),
    ("numchars", TxiCommand::NumChars),
    ("numcharspersheet", TxiCommand::NumCharsPerSheet),
    ("numx", TxiCommand::NumX),
    ("numy", TxiCommand::NumY),
    ("ondemand", TxiCommand::OnDemand),
    ("priority", TxiCommand::Priority),
    ("proceduretype", TxiCommand::ProcedureType),
    ("rows", TxiCommand::Rows),
    ("spacingB", TxiCommand::SpacingB),
    ("spacingR", TxiCommand::SpacingR),
    ("speed", TxiCommand::Speed),
    ("temporary", TxiCommand::Temporary),
    ("texturewidth", TxiCommand::TextureWidth),
    ("unique", TxiCommand::Unique),
    ("upperleftcoords", TxiCommand::UpperLeftCoords),
    ("waterheight", TxiCommand::WaterHeight),
    ("waterwidth", TxiCommand::WaterWidth),
    ("xbox_downsample", TxiCommand::XboxDownsample),
];

/// Looks up the keyword at the start of `line`.
///
/// Only the first whitespace-delimited word is considered and matching is
/// case-insensitive. Returns the command and the number of bytes the keyword
/// occupies, so the arguments start at `&line[consumed..]`.
pub fn parse_txi_command(line: &str) -> Option<(TxiCommand, usize)> {
    let word = line.split(char::is_whitespace).next()?;
    if word.is_empty() {
        return None;
    }

    TXI_COMMANDS
        .iter()
        .find(|(keyword, _)| keyword.eq_ignore_ascii_case(word))
        .map(|(_, command)| (*command, word.len()))
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum TxiBlending {
    Default,
    Additive,
    PunchThrough,
}

impl Default for TxiBlending {
    fn default() -> Self {
        TxiBlending::Default
    }
}

/// The subset of TXI features consumed by the scene graph.
#[derive(Debug, Clone, PartialEq)]
pub struct TxiFeatures {
    pub alpha_mean: Option<f32>,
    pub blending: TxiBlending,
    pub bumpy_shiny_texture: String,
    pub env_map_texture: String,
    pub decal: bool,
    pub cube: bool,
    pub is_bump_map: bool,
    pub is_light_map: bool,
    pub mipmap: bool,
    pub filter: bool,
    pub fps: f32,
}

impl Default for TxiFeatures {
    fn default() -> Self {
        Self {
            alpha_mean: None,
            blending: TxiBlending::Default,
            bumpy_shiny_texture: String::new(),
            env_map_texture: String::new(),
            decal: false,
            cube: false,
            is_bump_map: false,
            is_light_map: false,
            mipmap: true,
            filter: true,
            fps: 0.0,
        }
    }
}

fn parse_flag(args: &str) -> bool {
    args.parse::<i32>().map(|v| v != 0).unwrap_or(false)
}

impl TxiFeatures {
    /// Parses TXI text. Unknown keywords and malformed arguments are skipped,
    /// as are the coordinate lines following `upperleftcoords`/`lowerrightcoords`.
    pub fn parse(text: &str) -> Self {
        let mut features = Self::default();
        let mut skip_lines = 0usize;

        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            if skip_lines > 0 {
                skip_lines -= 1;
                continue;
            }

            let (command, consumed) = match parse_txi_command(line) {
                Some(c) => c,
                None => {
                    log::debug!("unknown TXI line \"{}\"", line);
                    continue;
                }
            };
            let args = line[consumed..].trim();

            match command {
                TxiCommand::AlphaMean => features.alpha_mean = args.parse().ok(),
                TxiCommand::Blending => {
                    features.blending = match args.to_ascii_lowercase().as_str() {
                        "additive" => TxiBlending::Additive,
                        "punchthrough" => TxiBlending::PunchThrough,
                        _ => TxiBlending::Default,
                    }
                }
                TxiCommand::BumpyShinyTexture => features.bumpy_shiny_texture = args.to_string(),
                TxiCommand::EnvMapTexture => features.env_map_texture = args.to_string(),
                TxiCommand::Decal => features.decal = parse_flag(args),
                TxiCommand::Cube => features.cube = parse_flag(args),
                TxiCommand::IsBumpMap => features.is_bump_map = parse_flag(args),
                TxiCommand::IsLightMap => features.is_light_map = parse_flag(args),
                TxiCommand::Mipmap => features.mipmap = parse_flag(args),
                TxiCommand::Filter => features.filter = parse_flag(args),
                TxiCommand::Fps => features.fps = args.parse().unwrap_or(0.0),
                TxiCommand::UpperLeftCoords | TxiCommand::LowerRightCoords => {
                    skip_lines = args.parse().unwrap_or(0);
                }
                _ => {}
            }
        }

        features
    }
}
