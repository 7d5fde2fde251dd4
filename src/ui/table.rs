use tabled::{settings::Style, Table, Tabled};
use crate::model::{Course, Instructor, Offering};
use crate::storage::CatalogStats;

#[derive(Tabled)]
struct StatRow {
    #[tabled(rename = "Table")]
    table: &'static str,
    #[tabled(rename = "Rows")]
    rows: usize,
}

/// Row counts per table, plus offerings whose references do not resolve
pub fn stats_table(stats: &CatalogStats) -> String {
    render(vec![
        StatRow { table: "Courses", rows: stats.courses },
        StatRow { table: "Instructors", rows: stats.instructors },
        StatRow { table: "Offerings", rows: stats.offerings },
        StatRow { table: "Dangling offerings", rows: stats.dangling },
    ])
}

#[derive(Tabled)]
struct CourseRow<'a> {
    #[tabled(rename = "ID")]
    id: i64,
    #[tabled(rename = "Course")]
    code: String,
    #[tabled(rename = "Title")]
    title: &'a str,
}

#[derive(Tabled)]
struct InstructorRow<'a> {
    #[tabled(rename = "ID")]
    id: i64,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Email")]
    email: &'a str,
}

#[derive(Tabled)]
struct OfferingRow<'a> {
    #[tabled(rename = "CRN")]
    crn: i64,
    #[tabled(rename = "Semester")]
    semester_code: i64,
    #[tabled(rename = "Course")]
    course: String,
    #[tabled(rename = "Instructor")]
    instructor: String,
    #[tabled(rename = "Email")]
    email: &'a str,
}

fn render<T: Tabled>(rows: Vec<T>) -> String {
    if rows.is_empty() {
        return String::new();
    }
    Table::new(rows).with(Style::rounded()).to_string()
}

pub fn course_table(courses: &[Course]) -> String {
    render(
        courses
            .iter()
            .map(|c| CourseRow {
                id: c.id,
                code: format!("{} {}", c.alpha, c.number),
                title: &c.title,
            })
            .collect(),
    )
}

pub fn instructor_table(instructors: &[Instructor]) -> String {
    render(
        instructors
            .iter()
            .map(|i| InstructorRow {
                id: i.id,
                name: format!("{}, {}", i.last_name, i.first_name),
                email: &i.email,
            })
            .collect(),
    )
}

pub fn offering_table(offerings: &[Offering]) -> String {
    render(
        offerings
            .iter()
            .map(|o| OfferingRow {
                crn: o.crn,
                semester_code: o.semester_code,
                course: format!("{} {} {}", o.course.alpha, o.course.number, o.course.title),
                instructor: o.instructor.full_name(),
                email: &o.instructor.email,
            })
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_tables_render_nothing() {
        assert!(course_table(&[]).is_empty());
        assert!(instructor_table(&[]).is_empty());
        assert!(offering_table(&[]).is_empty());
    }

    #[test]
    fn test_offering_table_contents() {
        let offering = Offering::new(
            10001,
            202380,
            Course::new(101, "CS", "273", "Intro to Mobile Dev"),
            Instructor::new(7, "Grace", "Hopper", "grace@example.edu"),
        );
        let table = offering_table(&[offering]);
        assert!(table.contains("10001"));
        assert!(table.contains("CS 273 Intro to Mobile Dev"));
        assert!(table.contains("Grace Hopper"));
    }

    #[test]
    fn test_stats_table() {
        let stats = CatalogStats { courses: 3, instructors: 2, offerings: 5, dangling: 1 };
        let table = stats_table(&stats);
        assert!(table.contains("Dangling offerings"));
        assert!(table.contains('5'));
    }
}
