mod symbols;

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use memmap2::Mmap;
use thiserror::Error;
use ubcd_decompiler::{
    DecompileContext, DecompileOptions, Decompiler, NoSymbols, SymbolResolver, TokenStream,
    disasm,
};
use ubcd_isa::{FormatVersion, NativeTableMap, OpcodeResolver, parse_rules};

use crate::symbols::SymbolTable;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

#[cfg(target_env = "msvc")]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[derive(Parser)]
#[command(name = "ubcd", about = "UnrealScript bytecode disassembler and decompiler")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print a token listing of one script body
    Disasm {
        #[command(flatten)]
        body: BodyArgs,
    },
    /// Decompile one script body to UnrealScript source
    Decompile {
        #[command(flatten)]
        body: BodyArgs,
        /// Output options (YAML)
        #[arg(long)]
        options: Option<PathBuf>,
        /// Class that owns the body, used for super() calls
        #[arg(long = "class")]
        owner_class: Option<String>,
    },
    /// Show the opcode table resolved for a format version
    Rules {
        #[command(flatten)]
        format: FormatArgs,
    },
}

#[derive(Args)]
struct FormatArgs {
    /// Package file version
    #[arg(long = "engine-version")]
    version: u16,
    /// Licensee version of the engine branch
    #[arg(long, default_value_t = 0)]
    licensee: u16,
    /// Extra opcode rules (YAML)
    #[arg(long)]
    rules: Option<PathBuf>,
}

#[derive(Args)]
struct BodyArgs {
    /// Raw script bytes of one function or state body
    input: PathBuf,
    #[command(flatten)]
    format: FormatArgs,
    /// Logical script size; defaults to the input length
    #[arg(long)]
    script_size: Option<u32>,
    /// Package names and objects (YAML)
    #[arg(long)]
    symbols: Option<PathBuf>,
    /// Native function table merged over the core table (YAML)
    #[arg(long)]
    natives: Option<PathBuf>,
}

#[derive(Debug, Error)]
enum CliError {
    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("{path}: {source}")]
    Yaml {
        path: PathBuf,
        source: serde_yaml::Error,
    },
    #[error("{path}: {source}")]
    Rules {
        path: PathBuf,
        source: ubcd_isa::RuleError,
    },
    #[error("{0}: input is larger than a script body can be")]
    TooLarge(PathBuf),
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Disasm { body } => cmd_disasm(&body),
        Commands::Decompile {
            body,
            options,
            owner_class,
        } => cmd_decompile(&body, options.as_deref(), owner_class.as_deref()),
        Commands::Rules { format } => cmd_rules(&format),
    };
    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn read_text(path: &Path) -> Result<String, CliError> {
    fs::read_to_string(path).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn map_input(path: &Path) -> Result<Mmap, CliError> {
    let io = |source| CliError::Io {
        path: path.to_path_buf(),
        source,
    };
    let file = File::open(path).map_err(io)?;
    // SAFETY: the mapping is read-only and copied out before the file could change.
    unsafe { Mmap::map(&file) }.map_err(io)
}

impl FormatArgs {
    fn resolver(&self) -> Result<OpcodeResolver, CliError> {
        let format = FormatVersion::new(self.version, self.licensee);
        let overrides = match &self.rules {
            Some(path) => parse_rules(&read_text(path)?).map_err(|source| CliError::Rules {
                path: path.clone(),
                source,
            })?,
            None => Vec::new(),
        };
        log::debug!(
            "ubcd_cli: format {format} ({}), {} override rules",
            format.era(),
            overrides.len()
        );
        Ok(OpcodeResolver::with_rules(format, &overrides))
    }
}

/// Everything needed to decode and render one body.
struct Loaded {
    stream: TokenStream,
    natives: NativeTableMap,
    symbols: Box<dyn SymbolResolver>,
}

impl BodyArgs {
    fn load(&self) -> Result<Loaded, CliError> {
        let resolver = self.format.resolver()?;

        let mut natives = NativeTableMap::core();
        if let Some(path) = &self.natives {
            let extra = NativeTableMap::from_yaml(&read_text(path)?).map_err(|source| {
                CliError::Rules {
                    path: path.clone(),
                    source,
                }
            })?;
            natives.merge(extra);
        }

        let symbols: Box<dyn SymbolResolver> = match &self.symbols {
            Some(path) => Box::new(SymbolTable::from_yaml(&read_text(path)?).map_err(
                |source| CliError::Yaml {
                    path: path.clone(),
                    source,
                },
            )?),
            None => Box::new(NoSymbols),
        };

        let code = map_input(&self.input)?.to_vec();
        let size = match self.script_size {
            Some(size) => size,
            None => u32::try_from(code.len())
                .map_err(|_| CliError::TooLarge(self.input.clone()))?,
        };
        let declaration = self
            .input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        log::info!(
            "ubcd_cli: {}: {} bytes, script size {size:#06x}",
            self.input.display(),
            code.len()
        );
        let mut stream = TokenStream::new(declaration, code, size);
        stream.ensure_deserialized(&resolver, &natives, symbols.as_ref());
        Ok(Loaded {
            stream,
            natives,
            symbols,
        })
    }
}

fn cmd_disasm(body: &BodyArgs) -> Result<(), CliError> {
    let loaded = body.load()?;
    print!("{}", disasm::listing(&loaded.stream));
    Ok(())
}

fn cmd_decompile(
    body: &BodyArgs,
    options: Option<&Path>,
    owner_class: Option<&str>,
) -> Result<(), CliError> {
    let options = match options {
        Some(path) => serde_yaml::from_str(&read_text(path)?).map_err(|source| CliError::Yaml {
            path: path.to_path_buf(),
            source,
        })?,
        None => DecompileOptions::default(),
    };
    let loaded = body.load()?;

    let mut decompiler = Decompiler::new(&loaded.stream, loaded.symbols.as_ref(), &loaded.natives);
    if let Some(class) = owner_class {
        decompiler = decompiler.with_owner_class(class);
    }
    let mut ctx = DecompileContext::new(options);
    print!("{}", decompiler.decompile(&mut ctx));
    Ok(())
}

fn cmd_rules(format: &FormatArgs) -> Result<(), CliError> {
    let resolver = format.resolver()?;
    let f = resolver.format();
    println!("# Format: {f} ({})", f.era());
    for (code, opcode) in resolver.entries() {
        println!("{code:#04x}  {opcode}");
    }
    Ok(())
}
