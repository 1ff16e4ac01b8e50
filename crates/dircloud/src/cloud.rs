//! HTML rendering of clouds and pages
//!
//! A cloud is the list of children of one branch, each drawn with a font
//! tier proportional to its size. Pages wrap a cloud with a header,
//! breadcrumbs and the search form.

use crate::dict::Definition;
use crate::format::{escape_html, human_readable, query_quote, thousands_separator, url_quote};
use crate::search::{MatchGroup, SearchBackendKind, SearchResults};
use crate::tree::Child;
use std::collections::{BTreeSet, HashMap};

/// Suffix that asks for a branch to be read from disk.
pub const READ_FROM_DISK: &str = "!";

const FONT_RANGE: u64 = 10;
const EQUAL_SIZES_TIER: u8 = 3;

/// Strings and switches a page needs from the configuration.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    pub logo_href: String,
    pub logo_img: String,
    pub search_tip: String,
    pub checkbox_tip: String,
    pub read_from_disk_tip: String,
    /// Sizes are abstract counts rather than bytes.
    pub non_disk: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            logo_href: "http://localhost".to_string(),
            logo_img: String::new(),
            search_tip: "Search files or directories".to_string(),
            checkbox_tip: "Search using a regular expression".to_string(),
            read_from_disk_tip: "Read the contents of the disc, bypassing the cache".to_string(),
            non_disk: false,
        }
    }
}

/// Font tier, 0 to 9, for every size in `sizes`, in the same order.
///
/// With exactly two distinct sizes the floor is 1 so that two close
/// values do not land at opposite ends of the scale. When all sizes are
/// equal every entry gets a middle tier.
pub fn font_tiers(sizes: &[u64]) -> Vec<u8> {
    let Some(&ceiling) = sizes.iter().max() else {
        return Vec::new();
    };
    let distinct: BTreeSet<u64> = sizes.iter().copied().collect();
    let floor = if distinct.len() == 2 {
        1
    } else {
        distinct.first().copied().unwrap_or(0)
    };

    let mut tiers: HashMap<u64, u8> = HashMap::with_capacity(distinct.len());
    if ceiling == floor {
        for &size in &distinct {
            tiers.insert(size, EQUAL_SIZES_TIER);
        }
    } else if ceiling <= FONT_RANGE {
        let scale = FONT_RANGE as f64 / ceiling as f64;
        for &size in &distinct {
            let tier = (size as f64 * scale - 1.0).round().clamp(0.0, 9.0);
            tiers.insert(size, tier as u8);
        }
    } else {
        let mut increment = (ceiling - floor) as f64 / FONT_RANGE as f64;
        if increment == 0.0 {
            increment = 1.0;
        }
        let ranges: Vec<u64> = (0..FONT_RANGE)
            .map(|i| (floor as f64 + increment * i as f64).round() as u64)
            .collect();
        for &size in &distinct {
            let tier = ranges
                .iter()
                .position(|&limit| limit >= size)
                .unwrap_or(ranges.len() - 1);
            tiers.insert(size, tier as u8);
        }
    }

    sizes
        .iter()
        .map(|size| tiers.get(size).copied().unwrap_or(EQUAL_SIZES_TIER))
        .collect()
}

/// Index of the first entry of the second run when `names` are one run
/// of numeric names followed by one run of other names (or the reverse).
pub fn split_point<'a>(names: impl IntoIterator<Item = &'a str>) -> Option<usize> {
    let mut split = None;
    let mut changes = 0;
    let mut previous: Option<bool> = None;
    for (i, name) in names.into_iter().enumerate() {
        let trimmed = name.trim_end_matches('/');
        let numeric = !trimmed.is_empty() && trimmed.chars().all(|c| c.is_ascii_digit());
        if previous != Some(numeric) {
            changes += 1;
        }
        previous = Some(numeric);
        if changes == 2 && split.is_none() {
            split = Some(i);
        } else if changes > 2 {
            return None;
        }
    }
    split
}

#[derive(Debug, Clone)]
pub struct Renderer {
    options: RenderOptions,
}

/// The parts of a tree page.
#[derive(Debug, Default)]
pub struct Page<'a> {
    /// Branch path without the leading `/`, empty for the root
    pub dirpath: &'a str,
    /// Size shown next to the breadcrumbs
    pub size: u64,
    pub header: &'a str,
    pub search: &'a str,
    pub body: &'a str,
    pub footer: &'a str,
}

/// What the statistics page shows.
#[derive(Debug)]
pub struct Statistics<'a> {
    pub host: &'a str,
    pub backend: Vec<String>,
    pub files: &'a [String],
    pub last_modified: &'a str,
    pub branches: usize,
    pub space: &'a [Child],
}

impl Renderer {
    pub fn new(options: RenderOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    fn size(&self, size: u64) -> String {
        human_readable(size, self.options.non_disk)
    }

    /// Renders a cloud of `entries`. Links are relative, prefixed with
    /// `prefix`.
    pub fn cloud(&self, entries: &[Child], prefix: &str, strip_trailing_slash: bool) -> String {
        if entries.is_empty() {
            return String::new();
        }

        let sizes: Vec<u64> = entries.iter().map(|e| e.size).collect();
        let tiers = font_tiers(&sizes);
        let split = split_point(entries.iter().map(|e| e.name.as_str()));

        let mut cloud = vec![r#"<div id="htmltagcloud">"#.to_string()];
        for (i, (entry, tier)) in entries.iter().zip(tiers).enumerate() {
            let name = if strip_trailing_slash {
                entry.name.trim_end_matches('/')
            } else {
                entry.name.as_str()
            };
            let (style, label) = if name.ends_with('/') {
                let label = name.trim_end_matches('/');
                ("", if label.is_empty() { "/" } else { label })
            } else {
                (r#" style="font-style: italic;""#, name)
            };
            if split == Some(i) {
                cloud.push("<p />\n<hr />\n<p />".to_string());
            }
            let href = escape_html(&url_quote(&format!("{}{}", prefix, name)));
            cloud.push(format!(
                r#" <span class="tagcloud{tier}" title="{title}"><a{style} href="{href}">{label}</a></span>
 <span class="filesize"><a{style} href="{href}{disk}" title="{tip}">({size})</a></span>
"#,
                tier = tier,
                title = escape_html(&entry.timestamp),
                style = style,
                href = href,
                label = escape_html(label),
                disk = READ_FROM_DISK,
                tip = escape_html(&self.options.read_from_disk_tip),
                size = self.size(entry.size).replace(' ', "&nbsp;"),
            ));
        }
        cloud.push("</div>".to_string());
        cloud.join("\n")
    }

    /// The `<html>` head and page banner. `breadcrumb` is inserted as is.
    pub fn head(&self, title: &str, title_href: &str, dirpath: &str, breadcrumb: &str) -> String {
        format!(
            r#"<html>
 <head>
  <meta charset="utf-8">
  <title>{title} of {dirpath}</title>
 </head>
 {css}
 <body>
  <div class="page_header">
   <a title="logo" href="{logo_href}"><img src="{logo_img}" alt="logo" class="logo"/></a>
   <a href="{title_href}">{title}</a> of {breadcrumb}
  </div>
"#,
            title = escape_html(title),
            dirpath = escape_html(dirpath),
            css = CSS,
            logo_href = escape_html(&self.options.logo_href),
            logo_img = escape_html(&self.options.logo_img),
            title_href = escape_html(title_href),
            breadcrumb = breadcrumb,
        )
    }

    pub fn breadcrumbs(&self, dirpath: &str, size: u64) -> String {
        let mut href = String::from("/");
        let mut crumbs = Vec::new();
        let mut parents: Vec<&str> = dirpath.split('/').collect();
        parents.pop();
        for parent in parents {
            href.push_str(parent);
            href.push('/');
            crumbs.push(format!(
                r#"<a href="{}">{}</a>"#,
                escape_html(&url_quote(&href)),
                escape_html(parent)
            ));
        }
        crumbs.push(format!(
            r#" <span class="filesize"><a href="{}" title="{}">({})</a></span>"#,
            READ_FROM_DISK,
            escape_html(&self.options.read_from_disk_tip),
            self.size(size)
        ));
        crumbs.join("/")
    }

    /// Banner line above a tree cloud.
    pub fn stale_info(&self, entries: usize, size: u64) -> String {
        format!(
            r#"<div class="stale_info">{} directories, <a href="/?dircloud=statistics">{}</a></div>"#,
            entries,
            self.size(size)
        )
    }

    fn search_form(&self, search: &str) -> String {
        format!(
            r#"
<form method="get" action="/search" enctype="application/x-www-form-urlencoded">
 <p align="center" class="searchbox">Search:
 <input type="text" name="q" value="{}" title="{}"/>
 <input type="checkbox" name="match" title="{}"/>Search also alternative results
 </p>
</form>
"#,
            escape_html(search),
            escape_html(&self.options.search_tip),
            escape_html(&self.options.checkbox_tip)
        )
    }

    pub fn page(&self, page: &Page<'_>) -> String {
        let dirpath = if page.dirpath.is_empty() || page.dirpath == READ_FROM_DISK {
            "/"
        } else {
            page.dirpath
        };
        let breadcrumb = self.breadcrumbs(page.dirpath, page.size);
        let head = self.head("Dircloud", "/", dirpath, &breadcrumb);
        let form = self.search_form(page.search);
        let footer = format!("{}{}", page.footer, FOOTER);
        [head.as_str(), form.as_str(), page.header, page.body, footer.as_str()].join("\n<p>")
    }

    /// Body of the search page.
    pub fn search_results(&self, results: &SearchResults) -> String {
        let mut out = Vec::new();
        if let Some(error) = &results.error {
            out.push(format!(r#"<div class="stale_info">{}</div>"#, escape_html(error)));
        }
        if !results.definitions.is_empty() {
            out.push(definitions_html(&results.definitions));
        }
        if !results.suggestions.is_empty() {
            out.push(matches_html(&results.suggestions));
        }
        for path in &results.paths {
            out.push(path_link(path));
        }
        if results.truncated {
            out.push("<small><i>(etc.)</i></small> <br/>".to_string());
        }
        if results.is_empty() && results.error.is_none() {
            out.push("No files found".to_string());
        }
        out.join("\n")
    }

    pub fn search_page(&self, query: &str, size: u64, results: &SearchResults) -> String {
        let body = self.search_results(results);
        self.page(&Page {
            dirpath: "",
            size,
            search: query,
            body: &body,
            ..Page::default()
        })
    }

    pub fn statistics_page(&self, stats: &Statistics<'_>) -> String {
        let mut body = vec!["<p />".to_string()];
        if !stats.backend.is_empty() {
            body.push(" <ul>".to_string());
            for line in &stats.backend {
                body.push(format!("  <li>{}</li>", escape_html(line)));
            }
            body.push(" </ul>".to_string());
        }
        body.push("<p />".to_string());

        if stats.files.len() > 1 {
            body.push(r#"<form action="/switch_file">"#.to_string());
            body.push("Input file".to_string());
            body.push(r#" <select name="filename" onchange="this.form.submit()">"#.to_string());
            for file in stats.files {
                body.push(format!(
                    r#"  <option value="{0}">{0}</option>"#,
                    escape_html(file)
                ));
            }
            body.push(" </select>".to_string());
            body.push("</form>".to_string());
        } else if let Some(file) = stats.files.first() {
            body.push(format!("Input file {}", escape_html(file)));
        }
        body.push(" <ul>".to_string());
        body.push(format!("  <li>last modified: {}</li>", escape_html(stats.last_modified)));
        body.push(format!(
            "  <li>{} directories</li>",
            thousands_separator(stats.branches as u64)
        ));
        body.push(" </ul>".to_string());
        body.push(self.cloud(stats.space, "?dircloud=", true));
        body.push("<p />".to_string());

        format!(
            "{}{}{}",
            self.head("Statistics", "/", stats.host, &escape_html(stats.host)),
            body.join("\n"),
            FOOTER
        )
    }

    pub fn space_page(&self, space: &[Child]) -> String {
        format!(
            "{}<p />\n{}\n<p />{}",
            self.head("Space", "/?dircloud=statistics", "dircloud", "dircloud"),
            self.cloud(space, "", false),
            FOOTER
        )
    }

    pub fn credits_page(&self, backend: SearchBackendKind) -> String {
        let mut body = vec![
            "<h1>Credits</h1>",
            " <ul>",
            r#"  <li><a href="http://sd.wareonearth.com/~phil/xdu/">xdu</a> for the original graphical disk usage application.</li>"#,
            r#"  <li><a href="http://repo.or.cz/">repo.or.cz</a> for inspiration and CSS for a web version.</li>"#,
        ];
        match backend {
            SearchBackendKind::Dict => {
                body.push(r#"  <li><a href="http://www.dict.org/">dict</a> for a wonderful indexing engine.</li>"#)
            }
            SearchBackendKind::Locate => body.push(
                r#"  <li><a href="http://savannah.gnu.org/projects/findutils/">locate</a> for efficient filename searching.</li>"#,
            ),
            SearchBackendKind::String => {}
        }
        body.push(" </ul>");
        format!(
            "{}{}{}",
            self.head("Credits", "/", "dircloud", "dircloud"),
            body.join("\n"),
            FOOTER
        )
    }

    /// Contents returned by the open-file fallback, one `<pre>` each.
    pub fn contents_page(&self, item: &str, contents: &[String]) -> String {
        let body: Vec<String> = contents
            .iter()
            .map(|text| format!("<pre>{}</pre>", escape_html(text)))
            .collect();
        format!(
            "{}{}{}",
            self.head("Dircloud", "/", item, &escape_html(item)),
            body.join("\n"),
            FOOTER
        )
    }
}

const FOOTER: &str = r#"
 <div class="stale_info">Page generated by <a href="/?dircloud=credits">dircloud</a></div>
</body>

</html>
"#;

fn search_link(word: &str) -> String {
    format!(
        r#"<a href="/search?q={}">{}</a>"#,
        escape_html(&query_quote(word)),
        escape_html(word)
    )
}

fn path_link(path: &str) -> String {
    let (dirname, filename) = match path.trim_end_matches('/').rfind('/') {
        Some(i) => (&path[..i], &path[i + 1..]),
        None => ("", path),
    };
    format!(
        r#"<a href="{dir_href}/">{dir}</a>/<a href="{href}">{file}</a><br/>"#,
        dir_href = escape_html(&url_quote(dirname)),
        dir = escape_html(dirname),
        href = escape_html(&url_quote(path)),
        file = escape_html(filename),
    )
}

fn definitions_html(definitions: &[Definition]) -> String {
    let mut out = vec![" <ol>".to_string()];
    for definition in definitions {
        out.push(format!(
            "  <li>{}: {}</li>",
            escape_html(&definition.database),
            search_link(&definition.term)
        ));
        out.push("  <ul>".to_string());
        let mut lines = definition.text.lines().peekable();
        if lines.peek().map(|l| l.trim()) == Some(definition.term.as_str()) {
            lines.next();
        }
        for line in lines {
            let line = line.trim_start();
            let item = match line.split_once(char::is_whitespace) {
                Some((key, value)) if !line.starts_with('/') => {
                    format!("{} {}", search_link(key), escape_html(value.trim_start()))
                }
                _ => escape_html(line),
            };
            out.push(format!("   <li>{}</li>", item));
        }
        out.push("  </ul>".to_string());
    }
    out.push(" </ol>".to_string());
    out.join("\n")
}

fn matches_html(groups: &[MatchGroup]) -> String {
    let several = groups.len() > 1;
    let mut out = Vec::new();
    if several {
        out.push(" <ol>".to_string());
    }
    for group in groups {
        if several {
            out.push(format!(
                "  <li>{}: {}</li>",
                escape_html(&group.strategy),
                escape_html(&group.description)
            ));
        } else {
            out.push(escape_html(&group.description));
        }
        out.push("  <ul>".to_string());
        let mut databases: Vec<(&str, Vec<String>)> = Vec::new();
        for m in &group.matches {
            match databases.iter_mut().find(|(db, _)| *db == m.database) {
                Some((_, words)) => words.push(search_link(&m.word)),
                None => databases.push((&m.database, vec![search_link(&m.word)])),
            }
        }
        for (database, words) in databases {
            out.push(format!("<li>{}: {}</li>", escape_html(database), words.join(" ")));
        }
        out.push("  </ul>".to_string());
    }
    if several {
        out.push(" </ol>".to_string());
    }
    out.join("\n")
}

const CSS: &str = r#"<style type="text/css">
body {
	font-family: sans-serif;
	font-size: small;
	border: solid #d9d8d1;
	border-width: 1px;
	margin: 10px;
	background-color: #ffffff;
	color: #000000;
}

a {
	color: #0000cc;
}

a:hover, a:active {
	color: #880000;
}

img.logo {
	border-width: 0;
	float: right;
}

hr {
	border: 0;
	height: 1px;
	color: #d9d8d1;
	background-color: #d9d8d1;
	width: 80%;
}

div.page_header {
	padding: 8px;
	font-size: 150%;
	font-weight: bold;
	height: 25px;
	background-color: #d9d8d1;
}

div.page_header a:visited {
	color: #0000cc;
}

div.page_header a:hover {
	color: #880000;
}

div.stale_info {
	display: block;
	text-align: right;
	font-style: italic;
}

#htmltagcloud {
	text-align: center;
	line-height: 1;
}

span.tagcloud0   { font-size: 10px; }
span.tagcloud1   { font-size: 13px; }
span.tagcloud2   { font-size: 16px; }
span.tagcloud3   { font-size: 19px; }
span.tagcloud4   { font-size: 22px; }
span.tagcloud5   { font-size: 25px; }
span.tagcloud6   { font-size: 28px; }
span.tagcloud7   { font-size: 31px; }
span.tagcloud8   { font-size: 34px; }
span.tagcloud9   { font-size: 37px; }
span[class^="tagcloud"] a { text-decoration: none; }
span.filesize { font-size: 9px; }
span.filesize a { text-decoration: none; }
</style>
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dict::Match;

    #[test]
    fn test_font_tiers_equal_sizes() {
        assert_eq!(font_tiers(&[7, 7, 7]), vec![3, 3, 3]);
        assert_eq!(font_tiers(&[500]), vec![3]);
        assert!(font_tiers(&[]).is_empty());
    }

    #[test]
    fn test_font_tiers_two_close_sizes() {
        // Floor of 1 keeps 99 and 100 at the top of the scale.
        assert_eq!(font_tiers(&[99, 100, 100]), vec![9, 9, 9]);
    }

    #[test]
    fn test_font_tiers_small_ceiling() {
        assert_eq!(font_tiers(&[1, 5, 10]), vec![0, 4, 9]);
        assert_eq!(font_tiers(&[0, 2, 4]), vec![0, 4, 9]);
    }

    #[test]
    fn test_font_tiers_ranges() {
        let tiers = font_tiers(&[0, 50, 100, 1000]);
        assert_eq!(tiers[0], 0);
        assert_eq!(tiers[1], 1);
        assert_eq!(tiers[2], 1);
        assert_eq!(tiers[3], 9);
    }

    #[test]
    fn test_split_point() {
        assert_eq!(split_point(["1990/", "1991/", "misc/", "other/"]), Some(2));
        assert_eq!(split_point(["a/", "b/", "2001/"]), Some(2));
        assert_eq!(split_point(["a/", "b/"]), None);
        assert_eq!(split_point(["1/", "a/", "2/"]), None);
    }

    #[test]
    fn test_cloud_styles_and_links() {
        let renderer = Renderer::new(RenderOptions::default());
        let entries = vec![
            Child::new("bin/", 5000, "2012-08-23 07:28"),
            Child::new("notes & <todo>.txt", 1024, ""),
        ];
        let html = renderer.cloud(&entries, "", false);

        assert!(html.contains(r#"<a href="bin/">bin</a>"#));
        assert!(html.contains(r#"href="bin/!""#));
        assert!(html.contains(r#"title="2012-08-23 07:28""#));
        assert!(html.contains(r#"style="font-style: italic;""#));
        assert!(html.contains("notes &amp; &lt;todo&gt;.txt"));
        assert!(html.contains("notes %26 &lt;todo&gt;.txt"));
        assert!(html.contains("(4.9&nbsp;KB)"));
        assert!(html.contains("(1.0&nbsp;KB)"));
    }

    #[test]
    fn test_cloud_split_rule() {
        let renderer = Renderer::new(RenderOptions::default());
        let entries = vec![
            Child::new("2011/", 10, ""),
            Child::new("2012/", 20, ""),
            Child::new("drafts/", 30, ""),
        ];
        let html = renderer.cloud(&entries, "", false);
        let rule = html.find("<hr />").unwrap();
        assert!(html.find("2012").unwrap() < rule);
        assert!(html.find("drafts").unwrap() > rule);
    }

    #[test]
    fn test_cloud_non_disk_counts() {
        let renderer = Renderer::new(RenderOptions {
            non_disk: true,
            ..RenderOptions::default()
        });
        let html = renderer.cloud(&[Child::new("a/", 1234567, "")], "", false);
        assert!(html.contains("(1,234,567)"));
    }

    #[test]
    fn test_space_cloud_prefix() {
        let renderer = Renderer::new(RenderOptions::default());
        let html = renderer.cloud(&[Child::new("used/", 2048, "Used space")], "?dircloud=", true);
        assert!(html.contains(r#"href="?dircloud=used""#));
        assert!(html.contains(">used</a>"));
    }

    #[test]
    fn test_breadcrumbs() {
        let renderer = Renderer::new(RenderOptions::default());
        let crumbs = renderer.breadcrumbs("boot/grub/", 150);
        assert!(crumbs.starts_with(r#"<a href="/boot/">boot</a>/<a href="/boot/grub/">grub</a>/"#));
        assert!(crumbs.contains("(150 bytes)"));
    }

    #[test]
    fn test_page_escapes_search() {
        let renderer = Renderer::new(RenderOptions::default());
        let html = renderer.page(&Page {
            search: r#""><script>"#,
            ..Page::default()
        });
        assert!(html.contains("Dircloud of /"));
        assert!(html.contains("&quot;&gt;&lt;script&gt;"));
        assert!(!html.contains("<script>"));
    }

    #[test]
    fn test_search_results_paths() {
        let renderer = Renderer::new(RenderOptions::default());
        let mut results = SearchResults::from_paths(vec!["/boot/grub/grub.cfg".to_string()]);
        let html = renderer.search_results(&results);
        assert_eq!(
            html,
            r#"<a href="/boot/grub/">/boot/grub</a>/<a href="/boot/grub/grub.cfg">grub.cfg</a><br/>"#
        );

        let dirs = SearchResults::from_paths(vec!["/boot/grub/".to_string()]);
        assert_eq!(
            renderer.search_results(&dirs),
            r#"<a href="/boot/">/boot</a>/<a href="/boot/grub/">grub/</a><br/>"#
        );

        results.truncated = true;
        assert!(renderer.search_results(&results).ends_with("(etc.)</i></small> <br/>"));
        assert_eq!(
            renderer.search_results(&SearchResults::default()),
            "No files found"
        );
    }

    #[test]
    fn test_search_results_dict() {
        let renderer = Renderer::new(RenderOptions::default());
        let results = SearchResults {
            definitions: vec![Definition {
                term: "grub".to_string(),
                database: "files".to_string(),
                description: "Files".to_string(),
                text: "grub\nboot /boot/grub/".to_string(),
            }],
            suggestions: vec![MatchGroup {
                strategy: "lev".to_string(),
                description: "Maybe you mean...".to_string(),
                matches: vec![Match {
                    database: "files".to_string(),
                    word: "grab".to_string(),
                }],
            }],
            ..SearchResults::default()
        };
        let html = renderer.search_results(&results);
        assert!(html.contains(r#"  <li>files: <a href="/search?q=grub">grub</a></li>"#));
        assert!(html.contains(r#"   <li><a href="/search?q=boot">boot</a> /boot/grub/</li>"#));
        assert!(html.contains("Maybe you mean..."));
        assert!(html.contains(r#"<li>files: <a href="/search?q=grab">grab</a></li>"#));
    }

    #[test]
    fn test_statistics_file_selector() {
        let renderer = Renderer::new(RenderOptions::default());
        let files = vec!["/srv/du.txt".to_string(), "/srv/old.txt".to_string()];
        let html = renderer.statistics_page(&Statistics {
            host: "localhost",
            backend: vec!["3 lines".to_string()],
            files: &files,
            last_modified: "2012-08-23 07:28",
            branches: 1234,
            space: &[],
        });
        assert!(html.contains(r#"<option value="/srv/old.txt">/srv/old.txt</option>"#));
        assert!(html.contains("<li>3 lines</li>"));
        assert!(html.contains("<li>1,234 directories</li>"));
        assert!(html.contains("last modified: 2012-08-23 07:28"));
    }
}
