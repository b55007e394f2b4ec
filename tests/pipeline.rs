use std::{fs, path::Path};

use burn::backend::NdArray;
use burn::data::dataloader::DataLoaderBuilder;
use classify_corpus::data::batcher::ClassifyBatcher;
use classify_corpus::data::corpus::CorpusConfig;
use classify_corpus::data::loader::CorpusFiles;
use classify_corpus::data::vocabulary::VocabConfig;
use classify_corpus::domain::buffer::Location;
use classify_corpus::domain::split::Split;
use classify_corpus::infra::corpus_cache::{CorpusCache, InvalidationPolicy};

/// Ten training reviews, four validation reviews, no vocab file.
fn write_reviews(dir: &Path) -> CorpusConfig {
    let train = [
        "A great film", "terrible plot", "great acting", "boring and slow",
        "Great great great", "slow plot", "loved it", "hated it",
        "great ending", "terrible ending",
    ];
    let train_labels = ["1", "0", "1", "0", "1", "0", "1", "0", "1", "0"];
    let valid = ["great film", "slow and boring", "loved the ending", "plot"];
    let valid_labels = ["1", "0", "1", "0"];

    fs::write(dir.join("train.txt"), train.join("\n") + "\n").unwrap();
    fs::write(dir.join("train.label"), train_labels.join("\n") + "\n").unwrap();
    fs::write(dir.join("valid.txt"), valid.join("\n") + "\n").unwrap();
    fs::write(dir.join("valid.label"), valid_labels.join("\n") + "\n").unwrap();

    CorpusConfig {
        vocab: VocabConfig { lower_case: true, ..VocabConfig::default() },
        align_len: 4,
    }
}

#[test]
fn build_cache_and_iterate_batches() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_reviews(dir.path());
    let files = CorpusFiles::new(dir.path());
    let cache = CorpusCache::in_dir(&files, InvalidationPolicy::SourceFingerprint);

    let corpus = cache.load_or_build(&files, &config).unwrap();
    let vocab = corpus.vocab();
    assert_eq!(vocab.idx2sym()[..4], ["<pad>", "<s>", "<unk>", "</s>"]);
    // "great" is the most frequent symbol once lower-cased
    assert_eq!(vocab.get_sym(4), Some("great"));

    let it = corpus.get_split_iterator("train", 3, Location::Host).unwrap();
    assert_eq!(it.n_batch(), 4);
    let lens: Vec<usize> = it.iter().map(|b| b.len).collect();
    assert_eq!(lens, vec![3, 3, 3]);

    // Restartable and identical on the second pass
    let first: Vec<_> = it.iter().collect();
    let second: Vec<_> = (&it).into_iter().collect();
    assert_eq!(first, second);
    assert_eq!(first[1].labels.as_slice(), &[0, 1, 0]);
    assert!(first.iter().all(|b| b.data.row_len() == 4));

    // Same corpus again, this time from cache.pt
    let reloaded = cache.load_or_build(&files, &config).unwrap();
    assert_eq!(corpus, reloaded);
}

#[test]
fn unknown_split_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_reviews(dir.path());
    let files = CorpusFiles::new(dir.path());
    let corpus = CorpusCache::in_dir(&files, InvalidationPolicy::Never)
        .load_or_build(&files, &config)
        .unwrap();

    let err = corpus.get_split_iterator("test", 2, Location::Host).unwrap_err();
    assert!(err.is_config());
    assert!(err.to_string().contains("'test'"));
}

#[test]
fn batches_upload_to_ndarray() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_reviews(dir.path());
    let files = CorpusFiles::new(dir.path());
    let corpus = CorpusCache::in_dir(&files, InvalidationPolicy::Never)
        .load_or_build(&files, &config)
        .unwrap();

    let batcher = ClassifyBatcher::<NdArray>::new(Default::default());
    let it = corpus.split_iterator(Split::Valid, 2, Location::Host).unwrap();
    let batch = batcher.from_labeled(&it.get_batch(0, None));
    assert_eq!(batch.tokens.dims(), [2, 4]);
    assert_eq!(batch.labels.dims(), [2]);

    let window = corpus
        .stream_iterator(Split::Valid, 2, Some(1), Location::Host)
        .unwrap()
        .get_batch(2, None);
    // seq_len 1 plus one step of look-back: rows [1, 3)
    assert_eq!(window.seq_len, 1);
    assert_eq!(batcher.from_window(&window).dims(), [2, 4]);
}

#[test]
fn dataset_feeds_burn_dataloader() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_reviews(dir.path());
    let files = CorpusFiles::new(dir.path());
    let corpus = CorpusCache::in_dir(&files, InvalidationPolicy::Never)
        .load_or_build(&files, &config)
        .unwrap();

    let batcher = ClassifyBatcher::<NdArray>::new(Default::default());
    let loader = DataLoaderBuilder::new(batcher)
        .batch_size(4)
        .build(corpus.dataset(Split::Train).unwrap());

    // The dataset view serves every row, the last one included
    let sizes: Vec<usize> = loader.iter().map(|b| b.labels.dims()[0]).collect();
    assert_eq!(sizes, vec![4, 4, 2]);
}
