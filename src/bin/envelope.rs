//! envelope CLI: operational tooling for symmetric envelopes
//!
//! Usage:
//!   envelope encrypt --key <key> [--cipher <name>] [--in <file>] [--out <file>]
//!   envelope decrypt --key <key> [--cipher <name>] [--in <file>] [--out <file>]
//!   envelope inspect [--in <file>] [--raw]
//!   envelope ciphers
//!   envelope digests

use std::fs;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use cipher_envelope::{
    inspect, CipherEngine, EnvelopeCipher, Options, OutputEncoding, RustCryptoEngine, DEFAULT_CIPHER,
    DEFAULT_TAG_LENGTH,
};
use tracing_subscriber::EnvFilter;
use zeroize::Zeroizing;

const KEY_ENV: &str = "ENVELOPE_KEY";

type CliResult = Result<(), Box<dyn std::error::Error>>;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_usage();
        return ExitCode::from(1);
    }

    let result = match args[1].as_str() {
        "encrypt" => parse_flags(&args[2..]).and_then(|f| cmd_encrypt(&f)),
        "decrypt" => parse_flags(&args[2..]).and_then(|f| cmd_decrypt(&f)),
        "inspect" => parse_flags(&args[2..]).and_then(|f| cmd_inspect(&f)),
        "ciphers" => cmd_list(RustCryptoEngine.available_ciphers(false)),
        "digests" => cmd_list(RustCryptoEngine.available_digests(false)),
        "--help" | "-h" => {
            print_usage();
            Ok(())
        }
        "--version" | "-V" => {
            println!("envelope {}", cipher_envelope::VERSION);
            Ok(())
        }
        cmd => {
            eprintln!("error: unknown command '{}'", cmd);
            print_usage();
            Err("unknown command".into())
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn print_usage() {
    eprintln!(
        r#"envelope - symmetric encryption envelopes (AES-CTR + SHA-256, AES-GCM)

USAGE:
    envelope <COMMAND> [OPTIONS]

COMMANDS:
    encrypt     Encrypt stdin or a file
    decrypt     Decrypt stdin or a file
    inspect     Show envelope metadata (no decryption)
    ciphers     List available ciphers
    digests     List available digests

OPTIONS:
    -c, --cipher <NAME>      Cipher (default: {DEFAULT_CIPHER})
    -k, --key <KEY>          Key material (or set {KEY_ENV})
        --key-file <FILE>    Read key material from a file
    -i, --in <FILE>          Input file (default: stdin)
    -o, --out <FILE>         Output file (default: stdout)
    -a, --aad <AAD>          Additional authenticated data (GCM only)
        --tag-length <N>     GCM tag length, 12..=16 (default: {DEFAULT_TAG_LENGTH})
        --raw                Binary envelope instead of base64
        --positional         Header-less iv || hash-or-tag || ciphertext layout
    -h, --help               Print help
    -V, --version            Print version

EXAMPLES:
    # Encrypt with the legacy CTR + SHA-256 suite
    envelope encrypt --cipher aes-256-ctr --key-file ./key --in notes.txt --out notes.env

    # Decrypt
    ENVELOPE_KEY=secret envelope decrypt --cipher aes-256-ctr --in notes.env

    # Inspect
    envelope inspect --in notes.env

LOGGING:
    RUST_LOG=cipher_envelope=debug envelope ...
"#
    );
}

#[derive(Default)]
struct Flags {
    cipher: Option<String>,
    key: Option<Zeroizing<Vec<u8>>>,
    input: Option<PathBuf>,
    output: Option<PathBuf>,
    aad: Vec<u8>,
    tag_length: Option<usize>,
    raw: bool,
    positional: bool,
}

impl Flags {
    fn options(&self) -> Options {
        let mut options = Options::new()
            .with_aad(self.aad.clone())
            .with_tag_length(self.tag_length.unwrap_or(DEFAULT_TAG_LENGTH));
        if self.raw {
            options = options.raw();
        }
        if self.positional {
            options = options.positional();
        }
        options
    }

    fn cipher(&self) -> Result<EnvelopeCipher, Box<dyn std::error::Error>> {
        let name = self.cipher.as_deref().unwrap_or(DEFAULT_CIPHER);
        Ok(EnvelopeCipher::new(name)?)
    }

    /// `--key` / `--key-file`, then the environment.
    fn key(&self) -> Result<Zeroizing<Vec<u8>>, Box<dyn std::error::Error>> {
        if let Some(ref key) = self.key {
            return Ok(key.clone());
        }
        match std::env::var(KEY_ENV) {
            Ok(value) if !value.is_empty() => Ok(Zeroizing::new(value.into_bytes())),
            _ => Err(format!("missing --key, --key-file or {}", KEY_ENV).into()),
        }
    }
}

fn parse_flags(args: &[String]) -> Result<Flags, Box<dyn std::error::Error>> {
    let mut flags = Flags::default();

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--cipher" | "-c" => {
                i += 1;
                flags.cipher = Some(args.get(i).ok_or("missing cipher name")?.clone());
            }
            "--key" | "-k" => {
                i += 1;
                let key = args.get(i).ok_or("missing key")?;
                flags.key = Some(Zeroizing::new(key.as_bytes().to_vec()));
            }
            "--key-file" => {
                i += 1;
                let path = args.get(i).ok_or("missing key file path")?;
                let mut bytes = Zeroizing::new(fs::read(path)?);
                // Editors leave a trailing newline behind.
                while matches!(bytes.last(), Some(b'\n' | b'\r')) {
                    bytes.pop();
                }
                flags.key = Some(bytes);
            }
            "--in" | "-i" => {
                i += 1;
                flags.input = Some(PathBuf::from(args.get(i).ok_or("missing input path")?));
            }
            "--out" | "-o" => {
                i += 1;
                flags.output = Some(PathBuf::from(args.get(i).ok_or("missing output path")?));
            }
            "--aad" | "-a" => {
                i += 1;
                flags.aad = args.get(i).ok_or("missing aad")?.as_bytes().to_vec();
            }
            "--tag-length" => {
                i += 1;
                let n = args.get(i).ok_or("missing tag length")?;
                flags.tag_length = Some(n.parse().map_err(|_| format!("invalid tag length: {}", n))?);
            }
            "--raw" => flags.raw = true,
            "--positional" => flags.positional = true,
            _ => return Err(format!("unknown option: {}", args[i]).into()),
        }
        i += 1;
    }

    Ok(flags)
}

fn read_input(flags: &Flags) -> io::Result<Vec<u8>> {
    if let Some(ref path) = flags.input {
        fs::read(path)
    } else {
        let mut buf = Vec::new();
        io::stdin().read_to_end(&mut buf)?;
        Ok(buf)
    }
}

fn write_output(flags: &Flags, data: &[u8]) -> io::Result<()> {
    if let Some(ref path) = flags.output {
        fs::write(path, data)
    } else {
        let mut stdout = io::stdout().lock();
        stdout.write_all(data)?;
        stdout.flush()
    }
}

fn cmd_encrypt(flags: &Flags) -> CliResult {
    let cipher = flags.cipher()?;
    let key = flags.key()?;
    let plaintext = Zeroizing::new(read_input(flags)?);

    let sealed = cipher.encrypt(&plaintext, &key, &flags.options())?;
    write_output(flags, sealed.as_bytes())?;

    if let Some(ref path) = flags.output {
        eprintln!(
            "Encrypted {} bytes -> {} bytes ({})",
            plaintext.len(),
            sealed.as_bytes().len(),
            cipher.suite().algorithm()
        );
        eprintln!("Output: {}", path.display());
    }

    Ok(())
}

fn cmd_decrypt(flags: &Flags) -> CliResult {
    let cipher = flags.cipher()?;
    let key = flags.key()?;
    let envelope = read_input(flags)?;

    let plaintext = Zeroizing::new(cipher.decrypt(&envelope, &key, &flags.options())?);
    write_output(flags, &plaintext)?;

    if let Some(ref path) = flags.output {
        eprintln!("Decrypted {} bytes -> {} bytes", envelope.len(), plaintext.len());
        eprintln!("Output: {}", path.display());
    }

    Ok(())
}

fn cmd_inspect(flags: &Flags) -> CliResult {
    if flags.positional {
        return Err("positional envelopes carry no header to inspect".into());
    }
    let envelope = read_input(flags)?;
    let encoding = if flags.raw {
        OutputEncoding::Raw
    } else {
        OutputEncoding::Base64
    };

    let info = inspect(&envelope, encoding)?;

    println!("Cipher Envelope");
    println!("===============");
    println!("Version:         {}", info.version);
    println!("Suite:           0x{:02X} ({})", info.suite_id, info.algorithm);
    println!(
        "Integrity:       {} ({} bytes)",
        if info.authenticated { "GCM tag" } else { "SHA-256 hash" },
        info.integrity_bytes
    );
    println!("IV Length:       {} bytes", info.iv_bytes);
    if info.authenticated {
        println!("AAD Length:      {} bytes", info.aad_bytes);
    }
    println!();
    println!("Total Size:      {} bytes", info.total_bytes);
    println!("Ciphertext Size: {} bytes", info.ciphertext_bytes);

    Ok(())
}

fn cmd_list(names: Vec<String>) -> CliResult {
    for name in names {
        println!("{}", name);
    }
    Ok(())
}
