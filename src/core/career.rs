const EDUCATION_KEYWORDS: [&str; 16] = [
    "대학교",
    "대학원",
    "대학",
    "고등학교",
    "학사",
    "석사",
    "박사",
    "졸업",
    "수료",
    "학과",
    "university",
    "college",
    "mba",
    "ph.d",
    "school",
    "졸",
];

// 含這些字眼的是任職經歷，即使同時提到學校 (例如「서울대학교 교수」)
const CAREER_MARKERS: [&str; 8] = ["교수", "총장", "병원", "연구원", "이사", "위원", "대표", "前"];

const BULLETS: [char; 9] = ['-', '•', '▶', '·', '○', '■', '□', '*', '◦'];

/// 將主要經歷拆成學歷與經歷兩欄，各段以 " / " 連接
pub fn split_career(main_career: &str) -> (String, String) {
    let normalized = main_career
        .replace("<br>", "\n")
        .replace("<br/>", "\n")
        .replace("<br />", "\n");

    let mut education = Vec::new();
    let mut experience = Vec::new();

    for segment in normalized.split(['\n', '\r', '/', ';', '|']) {
        let segment = segment.trim().trim_start_matches(BULLETS).trim();
        if segment.is_empty() || segment == "-" {
            continue;
        }

        if is_education(segment) {
            education.push(segment);
        } else {
            experience.push(segment);
        }
    }

    (education.join(" / "), experience.join(" / "))
}

pub fn is_education(segment: &str) -> bool {
    if CAREER_MARKERS.iter().any(|marker| segment.contains(marker)) {
        return false;
    }
    let lower = segment.to_lowercase();
    EDUCATION_KEYWORDS.iter().any(|keyword| lower.contains(keyword))
}
