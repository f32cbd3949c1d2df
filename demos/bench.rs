use nunitproj_rs::ProjectDocument;
use nunitproj_rs::path_utils::{canonicalize, relative_path, same_path_or_under};
use nunitproj_rs::xml::XmlTree;
use std::time::{Duration, Instant};

fn bench<T>(label: &str, iterations: u32, mut f: impl FnMut() -> T) -> Duration {
    // Warmup
    for _ in 0..5 {
        std::hint::black_box(f());
    }

    let mut total = Duration::ZERO;
    for _ in 0..iterations {
        let start = Instant::now();
        std::hint::black_box(f());
        total += start.elapsed();
    }

    let avg = total / iterations;
    println!("{label:<45} {iterations:>6} iterations   avg {avg:>12.3?}   total {total:>12.3?}");
    avg
}

/// A project with `configs` configurations of `assemblies` assemblies each.
fn synthetic_project(configs: usize, assemblies: usize) -> String {
    let mut text = String::from("<NUnitProject>\n  <Settings activeconfig=\"Config0\" />\n");
    for c in 0..configs {
        text.push_str(&format!("  <Config name=\"Config{c}\" appbase=\"bin/config{c}\">\n"));
        for a in 0..assemblies {
            text.push_str(&format!("    <assembly path=\"tests/suite{a}/Tests{a}.dll\" />\n"));
        }
        text.push_str("  </Config>\n");
    }
    text.push_str("</NUnitProject>");
    text
}

fn main() {
    let source = synthetic_project(8, 32);
    let iterations = 1000;

    println!("─── Performance: synthetic project ({} bytes) ───", source.len());
    println!();

    // 1. Path engine
    let paths = [
        r"C:\projects\tests\.\bin\..\obj\Debug\tests.dll",
        "/home/user/projects/a/b/c/../../d/./e/f.dll",
        "../../shared/lib/../bin/common.dll",
    ];
    bench("canonicalize (3 paths)", iterations * 10, || {
        paths.iter().map(|p| canonicalize(p)).collect::<Vec<_>>()
    });
    bench("relative_path", iterations * 10, || {
        relative_path("/home/user/projects/a", "/home/user/shared/lib/common.dll")
    });
    bench("same_path_or_under", iterations * 10, || {
        same_path_or_under("/folder1/folder2", "/folder1/./folder2/junk/../folder3", false)
    });

    // 2. roxmltree parse only (baseline)
    bench("roxmltree::Document::parse (XML only)", iterations, || {
        roxmltree::Document::parse(&source).map(|d| d.descendants().count())
    });

    // 3. Owned tree load + serialize
    bench("XmlTree::parse", iterations, || XmlTree::parse(&source).is_ok());
    let Ok(tree) = XmlTree::parse(&source) else {
        eprintln!("synthetic project failed to parse");
        return;
    };
    bench("XmlTree::to_xml", iterations, || tree.to_xml());

    // 4. Live views
    let doc = ProjectDocument::builder().load_xml(source.clone());
    bench("active_config_name + all assemblies", iterations, || {
        let active = doc.settings().active_config_name().map(str::len);
        let total: usize = doc.configs().iter().map(|c| c.assemblies().len()).sum();
        (active, total)
    });

    // 5. Mutation round-trip (edit + re-serialize)
    bench("rename config + add assembly", iterations, || {
        let mut d = ProjectDocument::builder().load_xml(source.clone());
        if let Some(mut config) = d.config_mut("Config0") {
            if let Err(e) = config.set_name("Renamed") {
                eprintln!("rename failed: {e}");
            }
            if let Err(e) = config.assemblies_mut().add("extra.dll") {
                eprintln!("add assembly failed: {e}");
            }
        }
        d.has_unsaved_changes()
    });

    println!();
    println!("Done.");
}
