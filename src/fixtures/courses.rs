use super::{Course, ProgramModule, SemesterWeek};

pub fn courses() -> Vec<Course> {
	vec![
		Course {
			course_id: 1,
			title: "Основы программирования".to_string(),
			department: "Кафедра Информатики".to_string(),
			tech_requirements: "Компьютерный класс с 20 рабочими станциями".to_string(),
			program: vec![
				module(
					"Введение",
					&["История вычислительной техники", "Обзор языков программирования"],
				),
				module("Базовые конструкции", &["Переменные", "Условные операторы", "Циклы"]),
			],
			semester_plan: vec![
				week(1, "Введение. Обзор курса", 2),
				week(2, "Основы синтаксиса", 2),
			],
			tags: tags(&["базовый курс", "программирование"]),
		},
		Course {
			course_id: 2,
			title: "Высшая математика".to_string(),
			department: "Кафедра Информатики".to_string(),
			tech_requirements: "Аудитория с проекторами, доской и компьютерными средствами".to_string(),
			program: vec![
				module("Анализ", &["Пределы", "Предел функции"]),
				module("Алгебра", &["Матрицы", "Векторы"]),
			],
			semester_plan: vec![
				week(1, "Лекция по теме: Производные", 2),
				week(2, "Лекция по теме: Интегралы", 2),
			],
			tags: tags(&["математика", "университетский курс"]),
		},
	]
}

fn module(name: &str, topics: &[&str]) -> ProgramModule {
	ProgramModule {
		module: name.to_string(),
		topics: topics.iter().map(|t| t.to_string()).collect(),
	}
}

fn week(week: u32, topic: &str, hours: u32) -> SemesterWeek {
	SemesterWeek {
		week,
		topic: topic.to_string(),
		hours,
	}
}

fn tags(values: &[&str]) -> std::collections::BTreeSet<String> {
	values.iter().map(|t| t.to_string()).collect()
}
