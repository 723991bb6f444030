// ─── Command Builder ───
// Turns a descriptor, resolved libraries and an identity into the program,
// argument vector and working directory of the game process.

use std::path::{Path, PathBuf};

use crate::core::auth::LaunchIdentity;
use crate::core::state::GameLayout;
use crate::core::version::{Platform, VersionDescriptor};

pub const LEGACY_MAIN_CLASS: &str = "net.minecraft.launchwrapper.Launch";
pub const MODERN_MAIN_CLASS: &str = "net.minecraft.client.main.Main";
pub const NATIVE_ACCESS_FLAG: &str = "--enable-native-access=ALL-UNNAMED";
pub const FIRST_THREAD_FLAG: &str = "-XstartOnFirstThread";

const USER_TYPE: &str = "mojang";
const VERSION_TYPE: &str = "release";
const REDACTED: &str = "<redacted>";

/// Version-id prefix → bootstrap class, checked in order. Ids matching no
/// row use [`MODERN_MAIN_CLASS`].
pub const MAIN_CLASS_TABLE: &[(&str, &str)] = &[
    ("a1.", LEGACY_MAIN_CLASS),
    ("b1.", LEGACY_MAIN_CLASS),
    ("c0.", LEGACY_MAIN_CLASS),
];

/// The declared main class wins; otherwise the table decides.
pub fn select_main_class(declared: Option<&str>, version_id: &str) -> String {
    if let Some(declared) = declared.map(str::trim).filter(|c| !c.is_empty()) {
        return declared.to_string();
    }
    MAIN_CLASS_TABLE
        .iter()
        .find(|(prefix, _)| version_id.starts_with(prefix))
        .map(|(_, class)| *class)
        .unwrap_or(MODERN_MAIN_CLASS)
        .to_string()
}

/// How game arguments are passed to the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgumentConvention {
    /// One template string with `${...}` placeholders.
    Legacy(String),
    /// Discrete flag/value pairs.
    Modern,
}

impl ArgumentConvention {
    pub fn for_descriptor(descriptor: &VersionDescriptor) -> Self {
        match &descriptor.minecraft_arguments {
            Some(template) => ArgumentConvention::Legacy(template.clone()),
            None => ArgumentConvention::Modern,
        }
    }
}

/// Values substituted into game arguments.
#[derive(Debug, Clone)]
pub struct GameContext<'a> {
    pub version_id: &'a str,
    pub game_dir: &'a str,
    pub assets_root: &'a str,
    pub asset_index: &'a str,
    pub identity: &'a LaunchIdentity,
}

impl GameContext<'_> {
    fn substitute(&self, token: &str, uuid: &str) -> String {
        token
            .replace("${auth_player_name}", &self.identity.username)
            .replace("${version_name}", self.version_id)
            .replace("${game_directory}", self.game_dir)
            .replace("${assets_root}", self.assets_root)
            .replace("${assets_index_name}", self.asset_index)
            .replace("${auth_uuid}", uuid)
            .replace("${auth_access_token}", &self.identity.access_token)
            .replace("${user_properties}", "{}")
            .replace("${user_type}", USER_TYPE)
    }
}

/// Game arguments under `convention`.
///
/// Legacy templates are split on whitespace before substitution, so values
/// containing spaces (such as a game directory) stay one token.
pub fn game_arguments(convention: &ArgumentConvention, ctx: &GameContext<'_>) -> Vec<String> {
    let uuid = ctx.identity.command_uuid();
    match convention {
        ArgumentConvention::Legacy(template) => template
            .split_whitespace()
            .map(|token| ctx.substitute(token, &uuid))
            .filter(|arg| !arg.is_empty())
            .collect(),
        ArgumentConvention::Modern => [
            ("--username", ctx.identity.username.as_str()),
            ("--version", ctx.version_id),
            ("--gameDir", ctx.game_dir),
            ("--assetsDir", ctx.assets_root),
            ("--assetIndex", ctx.asset_index),
            ("--uuid", uuid.as_str()),
            ("--accessToken", ctx.identity.access_token.as_str()),
            ("--userType", USER_TYPE),
            ("--versionType", VERSION_TYPE),
        ]
        .into_iter()
        .flat_map(|(flag, value)| [flag.to_string(), value.to_string()])
        .collect(),
    }
}

/// Existing library paths in order, then the client jar, joined with the
/// platform separator. Missing libraries are dropped here.
pub fn build_classpath(library_paths: &[PathBuf], client_jar: &Path, platform: Platform) -> String {
    library_paths
        .iter()
        .filter(|path| path.exists())
        .map(|path| safe_path_str(path))
        .chain(std::iter::once(safe_path_str(client_jar)))
        .collect::<Vec<_>>()
        .join(platform.classpath_separator())
}

/// Absolute form of `path` for command lines.
pub fn safe_path_str(path: &Path) -> String {
    let resolved = std::fs::canonicalize(path)
        .or_else(|_| std::path::absolute(path))
        .unwrap_or_else(|_| path.to_path_buf());
    let text = resolved.to_string_lossy().to_string();

    #[cfg(target_os = "windows")]
    {
        // The JVM rejects `\\?\` extended-length paths on the classpath.
        if let Some(stripped) = text.strip_prefix(r"\\?\") {
            return stripped.to_string();
        }
    }

    text
}

/// A fully built game command.
#[derive(Clone, PartialEq, Eq)]
pub struct LaunchCommand {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub working_dir: PathBuf,
    secret: Option<String>,
}

impl LaunchCommand {
    pub fn new(program: impl Into<PathBuf>, args: Vec<String>, working_dir: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args,
            working_dir: working_dir.into(),
            secret: None,
        }
    }

    /// Marks `secret` for redaction in [`LaunchCommand::display`].
    pub fn with_secret(mut self, secret: &str) -> Self {
        self.secret = Some(secret.to_string()).filter(|s| !s.is_empty());
        self
    }

    /// Program followed by the arguments.
    pub fn to_args(&self) -> Vec<String> {
        std::iter::once(self.program.to_string_lossy().to_string())
            .chain(self.args.iter().cloned())
            .collect()
    }

    /// Single loggable line with the access token redacted.
    pub fn display(&self) -> String {
        let line = self.to_args().join(" ");
        match &self.secret {
            Some(secret) => line.replace(secret.as_str(), REDACTED),
            None => line,
        }
    }
}

impl std::fmt::Debug for LaunchCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LaunchCommand")
            .field("command", &self.display())
            .field("working_dir", &self.working_dir)
            .finish()
    }
}

/// Everything the builder reads.
pub struct CommandInputs<'a> {
    pub java: &'a Path,
    pub platform: Platform,
    /// Version string reported by the runtime probe, if it succeeded.
    pub runtime_version: Option<&'a str>,
    pub max_memory: &'a str,
    pub min_memory: &'a str,
    pub layout: &'a GameLayout,
    pub descriptor: &'a VersionDescriptor,
    pub identity: &'a LaunchIdentity,
    pub library_paths: &'a [PathBuf],
}

pub fn build_command(inputs: &CommandInputs<'_>) -> LaunchCommand {
    let descriptor = inputs.descriptor;
    let layout = inputs.layout;
    let id = descriptor.id.as_str();

    let mut args = Vec::new();

    // ── JVM Arguments ──
    if inputs.platform == Platform::Osx {
        args.push(FIRST_THREAD_FLAG.to_string());
    }
    if inputs
        .runtime_version
        .is_some_and(super::java::native_access_required)
    {
        args.push(NATIVE_ACCESS_FLAG.to_string());
    }
    args.push(format!("-Xmx{}", inputs.max_memory));
    args.push(format!("-Xms{}", inputs.min_memory));
    args.push(format!(
        "-Djava.library.path={}",
        safe_path_str(&layout.natives_dir(id))
    ));

    // Classpath
    args.push("-cp".to_string());
    args.push(build_classpath(
        inputs.library_paths,
        &layout.client_jar(id),
        inputs.platform,
    ));

    // Main class
    args.push(select_main_class(descriptor.main_class.as_deref(), id));

    // ── Game Arguments ──
    let game_dir = safe_path_str(layout.root());
    let assets_root = safe_path_str(&layout.assets_dir());
    let ctx = GameContext {
        version_id: id,
        game_dir: &game_dir,
        assets_root: &assets_root,
        asset_index: descriptor.asset_index_id(),
        identity: inputs.identity,
    };
    args.extend(game_arguments(
        &ArgumentConvention::for_descriptor(descriptor),
        &ctx,
    ));

    LaunchCommand::new(inputs.java, args, layout.root())
        .with_secret(&inputs.identity.access_token)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn steve() -> LaunchIdentity {
        LaunchIdentity::new(
            "Steve",
            "11112222-3333-4444-5555-666677778888",
            "secret-token",
        )
    }

    fn ctx<'a>(identity: &'a LaunchIdentity) -> GameContext<'a> {
        GameContext {
            version_id: "1.8.9",
            game_dir: "/games/cat",
            assets_root: "/games/cat/assets",
            asset_index: "1.8",
            identity,
        }
    }

    #[test]
    fn main_class_table() {
        assert_eq!(select_main_class(None, "b1.7.3"), LEGACY_MAIN_CLASS);
        assert_eq!(select_main_class(None, "a1.0.4"), LEGACY_MAIN_CLASS);
        assert_eq!(select_main_class(None, "c0.30"), LEGACY_MAIN_CLASS);
        assert_eq!(select_main_class(None, "1.20.1"), MODERN_MAIN_CLASS);
        assert_eq!(select_main_class(Some("com.example.Main"), "b1.7.3"), "com.example.Main");
        assert_eq!(select_main_class(Some("  "), "1.2"), MODERN_MAIN_CLASS);
    }

    #[test]
    fn legacy_template_strips_uuid_hyphens_and_splits() {
        let identity = steve();
        let convention =
            ArgumentConvention::Legacy("--username ${auth_player_name} --uuid ${auth_uuid}".into());
        assert_eq!(
            game_arguments(&convention, &ctx(&identity)),
            vec!["--username", "Steve", "--uuid", "11112222333344445555666677778888"]
        );
    }

    #[test]
    fn legacy_template_fills_every_placeholder() {
        let identity = steve();
        let convention = ArgumentConvention::Legacy(
            "  --version ${version_name}   --gameDir ${game_directory} --assetsDir ${assets_root} \
             --assetIndex ${assets_index_name} --accessToken ${auth_access_token} \
             --userProperties ${user_properties} --userType ${user_type}  "
                .into(),
        );
        let ctx = GameContext {
            game_dir: "/home/a b/.cat",
            ..ctx(&identity)
        };
        assert_eq!(
            game_arguments(&convention, &ctx),
            vec![
                "--version", "1.8.9", "--gameDir", "/home/a b/.cat", "--assetsDir",
                "/games/cat/assets", "--assetIndex", "1.8", "--accessToken", "secret-token",
                "--userProperties", "{}", "--userType", "mojang",
            ]
        );
    }

    #[test]
    fn modern_convention_lists_flag_pairs() {
        let identity = steve();
        let args = game_arguments(&ArgumentConvention::Modern, &ctx(&identity));
        assert_eq!(args.len(), 18);
        assert_eq!(&args[..2], ["--username", "Steve"]);
        assert_eq!(&args[10..12], ["--uuid", "11112222333344445555666677778888"]);
        assert_eq!(&args[16..], ["--versionType", "release"]);
    }

    #[test]
    fn classpath_keeps_existing_libraries_then_client() {
        let temp = tempfile::tempdir().unwrap();
        let a = temp.path().join("a.jar");
        let b = temp.path().join("b.jar");
        let gone = temp.path().join("gone.jar");
        let client = temp.path().join("client.jar");
        std::fs::write(&a, b"").unwrap();
        std::fs::write(&b, b"").unwrap();

        let cp = build_classpath(&[a.clone(), gone, b.clone()], &client, Platform::Linux);
        let parts: Vec<&str> = cp.split(':').collect();
        assert_eq!(
            parts,
            vec![
                safe_path_str(&a).as_str(),
                safe_path_str(&b).as_str(),
                safe_path_str(&client).as_str()
            ]
        );
    }

    #[test]
    fn display_redacts_the_token() {
        let command = LaunchCommand::new(
            "java",
            vec!["--accessToken".into(), "secret-token".into()],
            "/games",
        )
        .with_secret("secret-token");
        assert_eq!(command.display(), "java --accessToken <redacted>");
        assert_eq!(command.to_args()[2], "secret-token");
        assert!(!format!("{command:?}").contains("secret-token"));
    }

    #[test]
    fn jvm_flags_precede_classpath_and_main_class() {
        let temp = tempfile::tempdir().unwrap();
        let layout = GameLayout::new(temp.path());
        let descriptor = VersionDescriptor::parse(
            "1.20.1",
            r#"{"id":"1.20.1","assetIndex":{"id":"5","url":"u"}}"#,
        )
        .unwrap();
        let identity = steve();
        let inputs = CommandInputs {
            java: Path::new("java"),
            platform: Platform::Osx,
            runtime_version: Some("21.0.2"),
            max_memory: "2G",
            min_memory: "512M",
            layout: &layout,
            descriptor: &descriptor,
            identity: &identity,
            library_paths: &[],
        };

        let command = build_command(&inputs);
        assert_eq!(command.program, PathBuf::from("java"));
        assert_eq!(command.working_dir, temp.path());
        assert_eq!(&command.args[..4], [FIRST_THREAD_FLAG, NATIVE_ACCESS_FLAG, "-Xmx2G", "-Xms512M"]);
        assert!(command.args[4].starts_with("-Djava.library.path="));
        assert_eq!(command.args[5], "-cp");
        assert_eq!(command.args[6], safe_path_str(&layout.client_jar("1.20.1")));
        assert_eq!(command.args[7], MODERN_MAIN_CLASS);
        assert_eq!(&command.args[8..10], ["--username", "Steve"]);
        assert!(command.args.contains(&"5".to_string()));

        let linux = CommandInputs {
            platform: Platform::Linux,
            runtime_version: Some("17.0.9"),
            ..inputs
        };
        let command = build_command(&linux);
        assert_eq!(command.args[0], "-Xmx2G");
    }
}
