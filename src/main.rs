use std::io;
use std::path::Path;
use std::process::ExitCode;

use ctc_lm_lib::lm::NgramModel;
use ctc_lm_lib::trie::build_vocabulary_trie_from_reader;
use ctc_lm_lib::CtcError;

fn run(model_path: &Path) -> Result<(), CtcError> {
    let model = NgramModel::load(model_path).map_err(|source| CtcError::LanguageModelLoad {
        path: model_path.to_path_buf(),
        source,
    })?;

    let trie = build_vocabulary_trie_from_reader(&model, io::stdin().lock())?;
    trie.write_to(io::stdout().lock())?;
    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() != 2 {
        let program = args
            .first()
            .map(String::as_str)
            .unwrap_or("ctc-generate-trie");
        eprintln!("Usage {program} <language_model_path>");
        return ExitCode::from(1);
    }

    match run(Path::new(&args[1])) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("Trie generation failed: {e}");
            eprintln!("{}", e.user_message());
            ExitCode::from(1)
        }
    }
}
