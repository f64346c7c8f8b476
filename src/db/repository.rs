use sqlx::SqlitePool;

use crate::models::{NewTodo, Todo, TodoChanges};

// Each function checks out one pooled connection; the guard hands it back to
// the pool when it drops, whichever way the function returns.

pub async fn fetch_todos(db: &SqlitePool) -> Result<Vec<Todo>, sqlx::Error> {
    let mut conn = db.acquire().await?;
    sqlx::query_as::<_, Todo>("SELECT id, task, done FROM todos ORDER BY id DESC")
        .fetch_all(&mut *conn)
        .await
}

pub async fn find_todo_by_id(db: &SqlitePool, id: i64) -> Result<Option<Todo>, sqlx::Error> {
    let mut conn = db.acquire().await?;
    sqlx::query_as::<_, Todo>("SELECT id, task, done FROM todos WHERE id = ?1")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await
}

pub async fn insert_todo(db: &SqlitePool, new: NewTodo) -> Result<Todo, sqlx::Error> {
    let mut conn = db.acquire().await?;
    sqlx::query_as::<_, Todo>(
        r#"
        INSERT INTO todos (task, done)
        VALUES (?1, ?2)
        RETURNING id, task, done
        "#,
    )
    .bind(new.task)
    .bind(new.done)
    .fetch_one(&mut *conn)
    .await
}

/// Applies `changes` in one statement. `None` means no row has `id`.
pub async fn update_todo(
    db: &SqlitePool,
    id: i64,
    changes: TodoChanges,
) -> Result<Option<Todo>, sqlx::Error> {
    let mut conn = db.acquire().await?;
    sqlx::query_as::<_, Todo>(
        r#"
        UPDATE todos
        SET task = COALESCE(?1, task),
            done = COALESCE(?2, done)
        WHERE id = ?3
        RETURNING id, task, done
        "#,
    )
    .bind(changes.task)
    .bind(changes.done)
    .bind(id)
    .fetch_optional(&mut *conn)
    .await
}

pub async fn delete_todo(db: &SqlitePool, id: i64) -> Result<bool, sqlx::Error> {
    let mut conn = db.acquire().await?;
    let result = sqlx::query("DELETE FROM todos WHERE id = ?1")
        .bind(id)
        .execute(&mut *conn)
        .await?
        .rows_affected();

    Ok(result > 0)
}
